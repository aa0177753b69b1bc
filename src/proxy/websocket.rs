//! Protocol upgrade (WebSocket) tunnelling.
//!
//! # Data Flow
//! ```text
//! Client ←──── upgraded bytes ────→ Gateway ←──── upgraded bytes ────→ Upstream
//! ```
//!
//! # Design Decisions
//! - Upgrades handled separately from HTTP request/response
//! - Byte-level tunnel (no frame parsing, any upgrade protocol works)
//! - Either side closing tears the whole tunnel down

use axum::http::{header, HeaderMap};
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;

/// True if the request asks to switch protocols.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    let has_upgrade = headers.contains_key(header::UPGRADE);
    let has_connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));
    has_upgrade && has_connection_upgrade
}

/// Bridge the client and upstream connections once both have upgraded.
pub async fn tunnel(client: OnUpgrade, upstream: OnUpgrade, target: String) {
    let (client, upstream) = match tokio::try_join!(client, upstream) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(target_url = %target, error = %e, "Upgrade handshake did not complete");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut upstream = TokioIo::new(upstream);

    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((to_upstream, to_client)) => {
            tracing::debug!(
                target_url = %target,
                bytes_to_upstream = to_upstream,
                bytes_to_client = to_client,
                "Upgraded connection closed"
            );
        }
        Err(e) => {
            tracing::debug!(target_url = %target, error = %e, "Upgraded connection ended with error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn detects_websocket_upgrade() {
        let mut headers = HeaderMap::new();
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, Upgrade"));
        assert!(is_upgrade_request(&headers));
    }

    #[test]
    fn needs_both_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        assert!(!is_upgrade_request(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
        assert!(!is_upgrade_request(&headers));
    }
}
