//! Configurable app: bearer-token identity and auth enforcement.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request};
use axum::response::Response;

use crate::app::App;
use crate::config::AppConfig;
use crate::error::GatewayError;
use crate::http::context::{RequestContext, User};
use crate::http::pipeline::Proceed;
use crate::http::response;

/// App built from `[apps.<name>]` configuration.
#[derive(Debug, Clone)]
pub struct StaticApp {
    name: String,
    require_auth: bool,
    tokens: HashMap<String, User>,
}

impl StaticApp {
    pub fn from_config(name: impl Into<String>, config: &AppConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|t| (t.token.clone(), User::new(t.id.clone(), t.name.clone())))
            .collect();

        Self {
            name: name.into(),
            require_auth: config.require_auth,
            tokens,
        }
    }

    /// An app that proxies everything and identifies nobody.
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            require_auth: false,
            tokens: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn authenticate(&self, headers: &HeaderMap) -> Option<User> {
        bearer_token(headers).and_then(|token| self.tokens.get(token).cloned())
    }
}

#[async_trait]
impl App for StaticApp {
    async fn handle(
        &self,
        req: Request<Body>,
        mut ctx: RequestContext,
        proceed: Proceed,
    ) -> Result<Response, GatewayError> {
        if let Some(user) = self.authenticate(req.headers()) {
            ctx.user = Some(user);
        }

        if self.require_auth && !ctx.public && ctx.user.is_none() {
            tracing::debug!(
                request_id = %ctx.request_id,
                app = %self.name,
                "Rejecting unauthenticated request"
            );
            return Ok(response::unauthorized());
        }

        proceed.run(req, ctx).await
    }
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn parses_bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer secret")), Some("secret"));
        assert_eq!(bearer_token(&headers("bearer  secret ")), Some("secret"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn authenticates_configured_tokens() {
        let app = StaticApp::from_config(
            "app1",
            &AppConfig {
                require_auth: true,
                tokens: vec![TokenConfig {
                    token: "secret".into(),
                    id: "user-id".into(),
                    name: "user-name".into(),
                }],
            },
        );

        assert_eq!(app.name(), "app1");
        assert_eq!(
            app.authenticate(&headers("Bearer secret")),
            Some(User::new("user-id", "user-name"))
        );
        assert_eq!(app.authenticate(&headers("Bearer wrong")), None);
    }
}
