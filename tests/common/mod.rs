//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use app_gateway::app::{App, AppRegistry};
use app_gateway::error::GatewayError;
use app_gateway::http::{Pipeline, Proceed, RequestContext, User};
use app_gateway::observability::InMemoryMetrics;
use app_gateway::proxy::{ProxyHooks, ProxyTransport};
use app_gateway::routing::{RouteCriteria, RouteDecision, Router};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a mock backend that answers every request with the request head it
/// received as the response body.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                loop {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }

                let head = String::from_utf8_lossy(&buf[..read]).to_string();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    head.len(),
                    head
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a WebSocket upstream that echoes every text message.
pub async fn start_websocket_echo() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_text() && ws.send(msg).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    addr
}

/// Router answering from a fixed host table and recording every lookup.
#[derive(Debug, Default)]
pub struct ScriptedRouter {
    routes: Vec<(String, RouteDecision)>,
    fail: bool,
    failing_host: Option<String>,
    calls: Mutex<Vec<RouteCriteria>>,
}

impl ScriptedRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Lookups for `host` fail, every other host resolves normally.
    pub fn failing_for(mut self, host: &str) -> Self {
        self.failing_host = Some(host.to_string());
        self
    }

    pub fn with_route(mut self, host: &str, app: &str, target: &str, public: bool) -> Self {
        self.routes.push((
            host.to_string(),
            RouteDecision {
                app: app.to_string(),
                target: target.to_string(),
                public,
            },
        ));
        self
    }

    pub fn calls(&self) -> Vec<RouteCriteria> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Router for ScriptedRouter {
    async fn route(&self, criteria: &RouteCriteria) -> Result<Option<RouteDecision>, GatewayError> {
        self.calls.lock().unwrap().push(criteria.clone());
        if self.fail || self.failing_host.as_deref() == Some(criteria.host.as_str()) {
            return Err(GatewayError::Routing("route store unavailable".into()));
        }
        Ok(self
            .routes
            .iter()
            .find(|(host, _)| *host == criteria.host)
            .map(|(_, decision)| decision.clone()))
    }
}

/// What a transport was asked to forward.
#[derive(Debug, Clone)]
pub struct Forwarded {
    pub target: String,
    pub upgrade: bool,
    pub headers: HeaderMap,
}

/// Transport that never dials out. Applies the hooks and answers 200.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    forwarded: Mutex<Vec<Forwarded>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forwarded(&self) -> Vec<Forwarded> {
        self.forwarded.lock().unwrap().clone()
    }

    fn record(&self, req: Request<Body>, target: &str, hooks: &dyn ProxyHooks, upgrade: bool) -> Response {
        let mut headers = req.headers().clone();
        hooks.on_proxy_req(&mut headers);
        self.forwarded.lock().unwrap().push(Forwarded {
            target: target.to_string(),
            upgrade,
            headers,
        });

        let mut response = (StatusCode::OK, "proxied").into_response();
        if !upgrade {
            hooks.on_proxy_res(response.headers_mut());
        }
        response
    }
}

#[async_trait]
impl ProxyTransport for RecordingTransport {
    async fn forward(
        &self,
        req: Request<Body>,
        target: &str,
        hooks: &dyn ProxyHooks,
    ) -> Result<Response, GatewayError> {
        Ok(self.record(req, target, hooks, false))
    }

    async fn forward_upgrade(
        &self,
        req: Request<Body>,
        target: &str,
        hooks: &dyn ProxyHooks,
    ) -> Result<Response, GatewayError> {
        Ok(self.record(req, target, hooks, true))
    }
}

/// App whose behavior is fixed up front.
#[derive(Debug, Clone, Default)]
pub struct TestApp {
    pub proceed: bool,
    pub fail: bool,
    pub user: Option<User>,
    pub seen: Arc<Mutex<Vec<RequestContext>>>,
}

impl TestApp {
    pub fn proceeding() -> Self {
        Self {
            proceed: true,
            ..Self::default()
        }
    }

    pub fn rejecting() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn seen(&self) -> Vec<RequestContext> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl App for TestApp {
    async fn handle(
        &self,
        req: Request<Body>,
        mut ctx: RequestContext,
        proceed: Proceed,
    ) -> Result<Response, GatewayError> {
        if self.user.is_some() {
            ctx.user = self.user.clone();
        }
        self.seen.lock().unwrap().push(ctx.clone());

        if self.fail {
            return Err(GatewayError::App("session store unavailable".into()));
        }
        if self.proceed {
            proceed.run(req, ctx).await
        } else {
            Ok((StatusCode::FORBIDDEN, "handled by app").into_response())
        }
    }
}

/// A pipeline plus handles on every double it was built from.
pub struct Harness {
    pub pipeline: Arc<Pipeline>,
    pub router: Arc<ScriptedRouter>,
    pub transport: Arc<RecordingTransport>,
    pub metrics: Arc<InMemoryMetrics>,
}

pub fn harness(router: ScriptedRouter, apps: Vec<(&str, Arc<dyn App>)>) -> Harness {
    let router = Arc::new(router);
    let transport = Arc::new(RecordingTransport::new());
    let metrics = Arc::new(InMemoryMetrics::new());
    let apps: AppRegistry = apps
        .into_iter()
        .map(|(name, app)| (name.to_string(), app))
        .collect();

    let pipeline = Arc::new(Pipeline::new(
        router.clone(),
        apps,
        transport.clone(),
        metrics.clone(),
    ));

    Harness {
        pipeline,
        router,
        transport,
        metrics,
    }
}

/// Request as it would arrive from a peer at `127.0.0.1`.
pub fn request(method: &str, host: Option<&str>, uri: &str) -> axum::http::request::Builder {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    if let Some(host) = host {
        builder = builder.header("host", host);
    }
    builder
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
