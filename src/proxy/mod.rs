//! Proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Proceed (from app) / upgrade dispatch
//!     → hooks.rs (HeaderRewrite built from the request context)
//!     → transport.rs (rewrite URI, fire on_proxy_req, send upstream)
//!     → hooks.rs (fire on_proxy_res on the upstream response)
//!     → websocket.rs (tunnel upgraded connections)
//! ```

pub mod hooks;
pub mod transport;
pub mod websocket;

pub use hooks::{HeaderRewrite, ProxyHooks, X_FORWARDED_USER};
pub use transport::{HyperTransport, ProxyTransport};
pub use websocket::is_upgrade_request;
