//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, method, peer)
//!     → RouteCriteria (built once per request)
//!     → Router::route (async lookup)
//!     → Return: RouteDecision { app, target, public } or None
//!
//! Route Compilation (at startup, StaticRouter):
//!     RouteConfig[]
//!     → Sort by priority
//!     → Compile matchers
//!     → Freeze as immutable router
//! ```
//!
//! # Design Decisions
//! - Routers are shared read-only across all requests
//! - `None` is a first-class outcome (404), not an error
//! - First match wins (ordered by priority)

pub mod matcher;
pub mod router;

use serde::{Deserialize, Serialize};

pub use router::{Router, StaticRouter};

/// What a router sees of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCriteria {
    pub host: String,
    pub url: String,
    pub method: String,
    pub remote: String,
}

/// The app and upstream a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub app: String,
    pub target: String,
    #[serde(default)]
    pub public: bool,
}
