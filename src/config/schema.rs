//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Plaintext listener.
    pub server: ListenConfig,

    /// TLS listener. Only started when `ssl` is present as well.
    #[serde(alias = "sslServer")]
    pub ssl_server: Option<ListenConfig>,

    /// Key and certificate for the TLS listener.
    pub ssl: Option<SslConfig>,

    /// Registered applications, keyed by name.
    pub apps: BTreeMap<String, AppConfig>,

    /// Route definitions mapping host/path to an app and upstream target.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// The TLS listener settings, if both halves are configured.
    pub fn tls(&self) -> Option<(&ListenConfig, &SslConfig)> {
        self.ssl_server.as_ref().zip(self.ssl.as_ref())
    }
}

/// Host and port a listener binds to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl std::fmt::Display for ListenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// PEM files for the TLS listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SslConfig {
    /// Path to private key file (PEM).
    pub key: PathBuf,

    /// Path to certificate file (PEM).
    pub cert: PathBuf,
}

/// Application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Reject unauthenticated requests on non-public routes.
    pub require_auth: bool,

    /// Bearer tokens accepted by this app.
    pub tokens: Vec<TokenConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            tokens: Vec::new(),
        }
    }
}

/// A bearer token and the identity it authenticates.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    pub token: String,
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Route configuration mapping requests to an app and upstream target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Host header to match (case-insensitive, port ignored).
    pub host: Option<String>,

    /// Path prefix to match.
    pub path_prefix: Option<String>,

    /// App that handles matched requests.
    pub app: String,

    /// Upstream base URL.
    pub target: String,

    /// Route does not require an authenticated user.
    #[serde(default)]
    pub public: bool,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
