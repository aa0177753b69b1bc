//! Multi-tenant application gateway library.

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::{GatewayServer, Pipeline};
pub use lifecycle::Shutdown;
