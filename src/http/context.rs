//! Per-request state threaded through the pipeline.
//!
//! A `RequestContext` is built once when a request arrives and moves with the
//! request through routing, the CORS check, the app and the proxy hooks. It is
//! never shared between requests.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, Request};

use crate::error::GatewayError;
use crate::routing::RouteCriteria;

/// Identity attached by an app after authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Forwardable identity, if any.
    pub fn forwarded_id(&self) -> Option<&str> {
        (!self.id.is_empty()).then_some(self.id.as_str())
    }
}

/// Gateway-owned decorations for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id (`x-request-id`).
    pub request_id: String,
    /// Routing input derived from the request.
    pub criteria: RouteCriteria,
    /// Raw `Origin` header, if present.
    pub origin: Option<String>,
    /// Caller origin is another app of this gateway.
    pub cors: bool,
    /// Matched route does not require authentication.
    pub public: bool,
    /// Authenticated user, set by the app.
    pub user: Option<User>,
}

impl RequestContext {
    /// Build the context for a freshly received request.
    pub fn from_request<B>(req: &Request<B>) -> Result<Self, GatewayError> {
        let host = request_host(req)?;

        let remote = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_default();

        let url = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let request_id = req
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        // An unusable Origin only costs the request its CORS trust
        let origin = req.headers().get(header::ORIGIN).and_then(|value| {
            value
                .to_str()
                .map_err(|_| {
                    tracing::debug!(request_id = %request_id, "Origin header is not valid text, ignoring it");
                })
                .ok()
                .map(ToString::to_string)
        });

        Ok(Self {
            request_id,
            criteria: RouteCriteria {
                host,
                url,
                method: req.method().to_string(),
                remote,
            },
            origin,
            cors: false,
            public: false,
            user: None,
        })
    }

    /// `X-Forwarded-User` value for the upstream request.
    pub fn forwarded_user(&self) -> Option<&str> {
        self.user.as_ref().and_then(User::forwarded_id)
    }
}

/// Host from the `Host` header, falling back to the URI authority (HTTP/2).
fn request_host<B>(req: &Request<B>) -> Result<String, GatewayError> {
    if let Some(value) = req.headers().get(header::HOST) {
        return value
            .to_str()
            .map(ToString::to_string)
            .map_err(|_| GatewayError::MalformedRequest("Host header is not valid text".into()));
    }

    req.uri()
        .authority()
        .map(|authority| authority.as_str().to_string())
        .ok_or_else(|| GatewayError::MalformedRequest("request has no Host".into()))
}
