//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router shared by every listener
//! - Wire up middleware (tracing, request ID)
//! - Bind the plaintext listener and, if configured, the TLS listener
//! - Dispatch requests and upgrades to the pipeline
//! - Graceful shutdown of all listeners

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::pipeline::Pipeline;
use crate::http::response;
use crate::lifecycle::Shutdown;
use crate::net::listener::{bind_http, bind_https, TlsListener};
use crate::proxy::is_upgrade_request;

const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The gateway's listeners, bound and ready to serve.
pub struct GatewayServer {
    router: Router,
    http: TcpListener,
    https: Option<TlsListener>,
}

impl GatewayServer {
    /// Bind every configured listener. Bind and TLS failures are fatal.
    pub async fn bind(config: &GatewayConfig, pipeline: Arc<Pipeline>) -> Result<Self, GatewayError> {
        let http = bind_http(&config.server).await?;

        let https = match config.tls() {
            Some((listen, ssl)) => Some(bind_https(listen, ssl).await?),
            None => {
                if config.ssl.is_some() || config.ssl_server.is_some() {
                    tracing::warn!("TLS listener needs both [ssl] and [ssl_server]; serving plaintext only");
                }
                None
            }
        };

        Ok(Self {
            router: build_router(pipeline),
            http,
            https,
        })
    }

    /// Address of the plaintext listener.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.http.local_addr()
    }

    /// Address of the TLS listener, if one is bound.
    pub fn tls_local_addr(&self) -> Option<SocketAddr> {
        self.https.as_ref().map(TlsListener::local_addr)
    }

    /// Serve until `shutdown` is triggered.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), GatewayError> {
        let Self { router, http, https } = self;

        let mut http_shutdown = shutdown.subscribe();
        let plain = axum::serve(
            http,
            router
                .clone()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = http_shutdown.recv().await;
        });

        let mut tls_shutdown = shutdown.subscribe();
        let tls = async move {
            let Some(https) = https else {
                return Ok(());
            };

            let handle = axum_server::Handle::new();
            let drain = handle.clone();
            tokio::spawn(async move {
                let _ = tls_shutdown.recv().await;
                drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
            });

            https
                .into_server()
                .handle(handle)
                .serve(router.into_make_service_with_connect_info::<SocketAddr>())
                .await
        };

        tokio::try_join!(async { plain.await }, tls)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/{*path}", any(gateway_handler))
        .route("/", any(gateway_handler))
        .with_state(pipeline)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Hands the request to its own pipeline task. If the client goes away the
/// task still finishes its current step and the response is dropped.
async fn gateway_handler(State(pipeline): State<Arc<Pipeline>>, request: Request<Body>) -> Response {
    let task = if is_upgrade_request(request.headers()) {
        tokio::spawn(pipeline.handle_upgrade(request))
    } else {
        tokio::spawn(pipeline.handle_request(request))
    };

    match task.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Request pipeline task failed");
            response::internal_error()
        }
    }
}
