//! Upstream transport.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the chosen upstream target
//! - Strip hop-by-hop headers in both directions
//! - Fire the request/response rewrite hooks
//! - Relay protocol upgrades
//!
//! # Design Decisions
//! - One pooled HTTP/1.1 client shared by all requests
//! - The client's `Host` header is preserved
//! - Upstream failures are not retried (requests are not known to be idempotent)

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Request, StatusCode, Uri, Version};
use axum::response::Response;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::error::GatewayError;
use crate::proxy::hooks::ProxyHooks;
use crate::proxy::websocket::tunnel;

/// Performs the byte-level exchange with an upstream.
#[async_trait]
pub trait ProxyTransport: Send + Sync + std::fmt::Debug {
    /// Forward a request and return the upstream's response.
    async fn forward(
        &self,
        req: Request<Body>,
        target: &str,
        hooks: &dyn ProxyHooks,
    ) -> Result<Response, GatewayError>;

    /// Forward an upgrade handshake and tunnel the upgraded connection.
    async fn forward_upgrade(
        &self,
        req: Request<Body>,
        target: &str,
        hooks: &dyn ProxyHooks,
    ) -> Result<Response, GatewayError>;
}

/// Transport backed by the hyper-util pooled client.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProxyTransport for HyperTransport {
    async fn forward(
        &self,
        req: Request<Body>,
        target: &str,
        hooks: &dyn ProxyHooks,
    ) -> Result<Response, GatewayError> {
        let (mut parts, body) = req.into_parts();
        parts.uri = upstream_uri(target, &parts.uri)?;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        hooks.on_proxy_req(&mut parts.headers);

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| GatewayError::Upstream(format!("{target}: {e}")))?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        hooks.on_proxy_res(&mut parts.headers);

        Ok(Response::from_parts(parts, Body::new(body)))
    }

    async fn forward_upgrade(
        &self,
        mut req: Request<Body>,
        target: &str,
        hooks: &dyn ProxyHooks,
    ) -> Result<Response, GatewayError> {
        let client_upgrade = hyper::upgrade::on(&mut req);

        let (mut parts, _body) = req.into_parts();
        parts.uri = upstream_uri(target, &parts.uri)?;
        parts.version = Version::HTTP_11;
        hooks.on_proxy_req(&mut parts.headers);

        let mut response = self
            .client
            .request(Request::from_parts(parts, Body::empty()))
            .await
            .map_err(|e| GatewayError::Upstream(format!("{target}: {e}")))?;

        if response.status() != StatusCode::SWITCHING_PROTOCOLS {
            tracing::debug!(
                target_url = %target,
                status = %response.status(),
                "Upstream declined upgrade"
            );
            let (parts, body) = response.into_parts();
            return Ok(Response::from_parts(parts, Body::new(body)));
        }

        let upstream_upgrade = hyper::upgrade::on(&mut response);
        tokio::spawn(tunnel(client_upgrade, upstream_upgrade, target.to_string()));

        let (parts, _body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::empty()))
    }
}

/// Join the target base URL with the request's path and query.
pub fn upstream_uri(target: &str, original: &Uri) -> Result<Uri, GatewayError> {
    let url = Url::parse(target).map_err(|e| GatewayError::InvalidTarget(format!("{target}: {e}")))?;

    match url.scheme() {
        "http" | "ws" => {}
        other => {
            return Err(GatewayError::InvalidTarget(format!(
                "{target}: unsupported scheme '{other}'"
            )))
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| GatewayError::InvalidTarget(format!("{target}: missing host")))?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let base = url.path().trim_end_matches('/');
    let path_and_query = original
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("http://{authority}{base}{path_and_query}")
        .parse()
        .map_err(|e| GatewayError::InvalidTarget(format!("{target}: {e}")))
}

const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
];

/// Remove connection-scoped headers, including any named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove("proxy-connection");
}
