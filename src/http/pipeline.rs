//! Per-request decision pipeline.
//!
//! # States
//! ```text
//! RECEIVED   build RouteCriteria from the request
//!            (no Host: count InboundRequest with an empty host, then 500)
//!   → ROUTED      Router::route, count InboundRequest
//!       → NOT_FOUND   404 "Not Found"
//!       → DISPATCHED  resolve CORS verdict, decorate, App::handle
//!           → PROXIED     proceed.run: count ProxyRequest, transport.forward
//!           → REJECTED    app answered without proceeding
//! any failure → 500 (502 if the upstream itself was unreachable)
//! ```
//!
//! Upgrades take the same path up to DISPATCHED and then go straight to
//! `transport.forward_upgrade`, skipping the app.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::app::AppRegistry;
use crate::error::GatewayError;
use crate::http::context::RequestContext;
use crate::http::response;
use crate::observability::{Metric, MetricsSink};
use crate::proxy::{HeaderRewrite, ProxyTransport};
use crate::routing::{RouteCriteria, RouteDecision, Router as ProxyRouter};

/// Everything a request needs, shared read-only across requests.
#[derive(Debug)]
pub struct Pipeline {
    router: Arc<dyn ProxyRouter>,
    apps: AppRegistry,
    transport: Arc<dyn ProxyTransport>,
    metrics: Arc<dyn MetricsSink>,
}

impl Pipeline {
    pub fn new(
        router: Arc<dyn ProxyRouter>,
        apps: AppRegistry,
        transport: Arc<dyn ProxyTransport>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            router,
            apps,
            transport,
            metrics,
        }
    }

    /// Run an ordinary request through the pipeline. Never fails: every
    /// error becomes an error response.
    pub async fn handle_request(self: Arc<Self>, req: Request<Body>) -> Response {
        let request_id = request_id(&req);
        match self.dispatch(req).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    error = %e,
                    error_type = e.error_type(),
                    "Request pipeline failed"
                );
                e.into_response()
            }
        }
    }

    /// Run an upgrade request through the pipeline.
    pub async fn handle_upgrade(self: Arc<Self>, req: Request<Body>) -> Response {
        let request_id = request_id(&req);
        match self.dispatch_upgrade(req).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    error = %e,
                    error_type = e.error_type(),
                    "Upgrade pipeline failed"
                );
                e.into_upgrade_response()
            }
        }
    }

    async fn dispatch(self: Arc<Self>, req: Request<Body>) -> Result<Response, GatewayError> {
        let mut ctx = self.context(&req)?;

        let Some(decision) = self.resolve_route(&mut ctx).await? else {
            return Ok(response::not_found());
        };

        let app = self
            .apps
            .get(&decision.app)
            .ok_or_else(|| GatewayError::UnknownApp(decision.app.clone()))?;

        let proceed = Proceed {
            pipeline: Arc::clone(&self),
            decision,
        };
        app.handle(req, ctx, proceed).await
    }

    async fn dispatch_upgrade(self: Arc<Self>, req: Request<Body>) -> Result<Response, GatewayError> {
        let mut ctx = self.context(&req)?;

        let Some(decision) = self.resolve_route(&mut ctx).await? else {
            return Ok(response::upgrade_not_found());
        };

        self.record_proxy(&ctx, &decision);
        let hooks = HeaderRewrite::from_context(&ctx);
        self.transport
            .forward_upgrade(req, &decision.target, &hooks)
            .await
    }

    /// Primary route lookup plus CORS resolution. Decorates `ctx` with the
    /// `cors` and `public` flags when a route matches.
    pub async fn resolve_route(
        &self,
        ctx: &mut RequestContext,
    ) -> Result<Option<RouteDecision>, GatewayError> {
        let lookup = self.router.route(&ctx.criteria).await;
        self.record_inbound(&ctx.criteria.host, &ctx.criteria.method);

        let Some(decision) = lookup? else {
            tracing::debug!(
                request_id = %ctx.request_id,
                host = %ctx.criteria.host,
                url = %ctx.criteria.url,
                "No route matched"
            );
            return Ok(None);
        };

        ctx.cors = self.resolve_cors(ctx).await?;
        ctx.public = decision.public;
        Ok(Some(decision))
    }

    /// Whether the request's `Origin` is itself an app of this gateway.
    ///
    /// Only meaningful once the request's own host has resolved: the verdict
    /// is true when the origin's host resolves as well.
    pub async fn resolve_cors(&self, ctx: &RequestContext) -> Result<bool, GatewayError> {
        let Some(origin) = ctx.origin.as_deref() else {
            return Ok(false);
        };
        let Some(host) = origin_host(origin) else {
            tracing::debug!(request_id = %ctx.request_id, origin, "Origin has no host");
            return Ok(false);
        };

        let criteria = RouteCriteria {
            host,
            url: "/".to_string(),
            method: ctx.criteria.method.clone(),
            remote: ctx.criteria.remote.clone(),
        };
        Ok(self.router.route(&criteria).await?.is_some())
    }

    /// Context for a new request. A request too malformed to route is still
    /// counted, under an empty host.
    fn context(&self, req: &Request<Body>) -> Result<RequestContext, GatewayError> {
        RequestContext::from_request(req).inspect_err(|_| {
            self.record_inbound("", req.method().as_str());
        })
    }

    fn record_inbound(&self, host: &str, method: &str) {
        self.metrics.increment(
            Metric::InboundRequest,
            &[("host", host.to_string()), ("method", method.to_string())],
        );
    }

    fn record_proxy(&self, ctx: &RequestContext, decision: &RouteDecision) {
        self.metrics.increment(
            Metric::ProxyRequest,
            &[
                ("app", decision.app.clone()),
                ("host", ctx.criteria.host.clone()),
                ("target", decision.target.clone()),
                ("public", decision.public.to_string()),
            ],
        );
    }
}

/// Continuation handed to an app. Consuming it proxies the request to the
/// matched target.
#[derive(Debug)]
pub struct Proceed {
    pipeline: Arc<Pipeline>,
    decision: RouteDecision,
}

impl Proceed {
    /// The route this request matched.
    pub fn decision(&self) -> &RouteDecision {
        &self.decision
    }

    /// Count the proxy request and forward to the upstream.
    pub async fn run(self, req: Request<Body>, ctx: RequestContext) -> Result<Response, GatewayError> {
        self.pipeline.record_proxy(&ctx, &self.decision);

        tracing::debug!(
            request_id = %ctx.request_id,
            app = %self.decision.app,
            target_url = %self.decision.target,
            "Proxying request"
        );

        let hooks = HeaderRewrite::from_context(&ctx);
        self.pipeline
            .transport
            .forward(req, &self.decision.target, &hooks)
            .await
    }
}

fn request_id<B>(req: &Request<B>) -> String {
    req.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Host (and non-default port) of an `Origin` header value.
fn origin_host(origin: &str) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
