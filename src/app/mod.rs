//! Application subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline (route matched, CORS resolved)
//!     → registry.rs (look up app by name)
//!     → App::handle(req, ctx, proceed)
//!         → app answers itself (never proceeds), or
//!         → proceed.run(req, ctx) → proxy
//! ```
//!
//! # Design Decisions
//! - Apps are built once at startup and never mutated
//! - `Proceed` is consumed by value, so an app can proceed at most once

pub mod registry;
pub mod static_app;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::error::GatewayError;
use crate::http::context::RequestContext;
use crate::http::pipeline::Proceed;

pub use registry::AppRegistry;
pub use static_app::StaticApp;

/// A backend application's request middleware.
#[async_trait]
pub trait App: Send + Sync + std::fmt::Debug {
    /// Handle a routed request. Call `proceed.run` to hand it to the proxy,
    /// or return a response directly to answer it without proxying.
    async fn handle(
        &self,
        req: Request<Body>,
        ctx: RequestContext,
        proceed: Proceed,
    ) -> Result<Response, GatewayError>;
}
