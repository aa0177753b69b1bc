//! Gateway error types.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Route lookup failed: {0}")]
    Routing(String),

    #[error("App middleware failed: {0}")]
    App(String),

    #[error("No app registered under name '{0}'")]
    UnknownApp(String),

    #[error("Invalid upstream target: {0}")]
    InvalidTarget(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("TLS material could not be loaded: {0}")]
    Tls(std::io::Error),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::Routing(_) => "routing_error",
            Self::App(_) => "app_error",
            Self::UnknownApp(_) => "unknown_app",
            Self::InvalidTarget(_) => "invalid_target",
            Self::Upstream(_) => "upstream_error",
            Self::Tls(_) => "tls_error",
            Self::Bind { .. } => "bind_error",
            Self::Io(_) => "io_error",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::MalformedRequest(_)
            | Self::Routing(_)
            | Self::App(_)
            | Self::UnknownApp(_)
            | Self::InvalidTarget(_)
            | Self::Tls(_)
            | Self::Bind { .. }
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response for a failed protocol upgrade. The connection is closed
    /// instead of being left open for reuse.
    pub fn into_upgrade_response(self) -> Response {
        let mut response = self.into_response();
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        response
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs
        let message = match status {
            StatusCode::BAD_GATEWAY => "Bad Gateway",
            _ => "Internal Server Error",
        };

        (status, message).into_response()
    }
}
