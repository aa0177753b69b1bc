//! Listener binding.
//!
//! # Responsibilities
//! - Bind the plaintext listener
//! - Load TLS material and bind the TLS listener
//! - Report the bound addresses
//!
//! # Design Decisions
//! - Both listeners are bound before any traffic is served, so a bad
//!   address or certificate stops startup instead of a background task
//! - No retry on bind failure

use std::net::SocketAddr;

use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use axum_server::Server;
use tokio::net::TcpListener;

use crate::config::{ListenConfig, SslConfig};
use crate::error::GatewayError;
use crate::net::tls::load_tls_config;

/// Bind the plaintext listener.
pub async fn bind_http(listen: &ListenConfig) -> Result<TcpListener, GatewayError> {
    let listener = TcpListener::bind((listen.host.as_str(), listen.port))
        .await
        .map_err(|source| GatewayError::Bind {
            address: listen.to_string(),
            source,
        })?;

    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "HTTP listener bound");

    Ok(listener)
}

/// A bound TCP socket plus the TLS material to serve on it.
pub struct TlsListener {
    listener: std::net::TcpListener,
    config: RustlsConfig,
    local_addr: SocketAddr,
}

impl TlsListener {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn into_server(self) -> Server<RustlsAcceptor> {
        axum_server::from_tcp_rustls(self.listener, self.config)
    }
}

/// Load the key/certificate and bind the TLS listener.
pub async fn bind_https(listen: &ListenConfig, ssl: &SslConfig) -> Result<TlsListener, GatewayError> {
    let config = load_tls_config(&ssl.cert, &ssl.key)
        .await
        .map_err(GatewayError::Tls)?;

    let listener = std::net::TcpListener::bind((listen.host.as_str(), listen.port)).map_err(|source| {
        GatewayError::Bind {
            address: listen.to_string(),
            source,
        }
    })?;
    listener.set_nonblocking(true)?;

    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        cert = %ssl.cert.display(),
        "HTTPS listener bound"
    );

    Ok(TlsListener {
        listener,
        config,
        local_addr,
    })
}
