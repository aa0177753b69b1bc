//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the router, app registry and transport from configuration
//! - Bind listeners and hand back a server ready to run
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners bind last (traffic only when ready)

use std::sync::Arc;

use crate::app::AppRegistry;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::{GatewayServer, Pipeline};
use crate::observability::MetricsSink;
use crate::proxy::HyperTransport;
use crate::routing::StaticRouter;

/// Pipeline wired with the configured routes and apps.
pub fn build_pipeline(config: &GatewayConfig, metrics: Arc<dyn MetricsSink>) -> Arc<Pipeline> {
    let router = StaticRouter::from_config(config.routes.clone());
    let apps = AppRegistry::from_config(&config.apps);

    tracing::info!(routes = router.len(), apps = apps.len(), "Routing table compiled");

    Arc::new(Pipeline::new(
        Arc::new(router),
        apps,
        Arc::new(HyperTransport::new()),
        metrics,
    ))
}

/// Build the pipeline and bind every configured listener.
pub async fn start(config: &GatewayConfig, metrics: Arc<dyn MetricsSink>) -> Result<GatewayServer, GatewayError> {
    let pipeline = build_pipeline(config, metrics);
    GatewayServer::bind(config, pipeline).await
}
