//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, upgrade detection)
//!     → context.rs (RouteCriteria + per-request decorations)
//!     → pipeline.rs (route → CORS → app → proceed → proxy)
//!     → response.rs (404 / 401 / 500 produced by the gateway itself)
//!     → Send to client
//! ```

pub mod context;
pub mod pipeline;
pub mod response;
pub mod server;

pub use context::{RequestContext, User};
pub use pipeline::{Pipeline, Proceed};
pub use server::{build_router, GatewayServer};
