//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! [server] host:port
//!     → listener.rs (bind plaintext socket)
//! [ssl_server] host:port + [ssl] key/cert
//!     → tls.rs (load PEM material)
//!     → listener.rs (bind TLS socket)
//!     → Hand off to HTTP layer (same router for both)
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled transparently
//! - Listener lifecycle is separate from request handling

pub mod listener;
pub mod tls;
