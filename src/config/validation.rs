//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing apps)
//! - Validate upstream targets
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{0} has an empty name")]
    EmptyRouteName(usize),

    #[error("route '{0}' is defined more than once")]
    DuplicateRoute(String),

    #[error("route '{route}' references unknown app '{app}'")]
    UnknownApp { route: String, app: String },

    #[error("route '{route}' has invalid target '{target}': {reason}")]
    InvalidTarget {
        route: String,
        target: String,
        reason: String,
    },

    #[error("ssl.{0} path is empty")]
    EmptySslPath(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, route) in config.routes.iter().enumerate() {
        if route.name.is_empty() {
            errors.push(ValidationError::EmptyRouteName(index));
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }

        if !config.apps.contains_key(&route.app) {
            errors.push(ValidationError::UnknownApp {
                route: route.name.clone(),
                app: route.app.clone(),
            });
        }

        if let Err(reason) = check_target(&route.target) {
            errors.push(ValidationError::InvalidTarget {
                route: route.name.clone(),
                target: route.target.clone(),
                reason,
            });
        }
    }

    if let Some(ssl) = &config.ssl {
        if ssl.key.as_os_str().is_empty() {
            errors.push(ValidationError::EmptySslPath("key"));
        }
        if ssl.cert.as_os_str().is_empty() {
            errors.push(ValidationError::EmptySslPath("cert"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_target(target: &str) -> Result<(), String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "ws" => {}
        other => return Err(format!("unsupported scheme '{other}'")),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}
