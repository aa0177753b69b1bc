//! Header rewriting around the upstream exchange.
//!
//! # Responsibilities
//! - Inject or scrub `X-Forwarded-User` on the upstream request
//! - Add credentialed CORS headers to responses for trusted origins
//!
//! # Design Decisions
//! - Identity is only ever forwarded from the app-attached user, never from
//!   whatever the client sent
//! - CORS headers are left untouched unless the request's origin was trusted

use axum::http::header::{ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::http::context::RequestContext;

pub static X_FORWARDED_USER: HeaderName = HeaderName::from_static("x-forwarded-user");

/// Callbacks a transport fires during one upstream exchange.
pub trait ProxyHooks: Send + Sync {
    /// Headers about to be sent upstream.
    fn on_proxy_req(&self, headers: &mut HeaderMap);

    /// Headers about to be sent back to the client.
    fn on_proxy_res(&self, headers: &mut HeaderMap);
}

/// Rewrites derived from a request's context.
#[derive(Debug, Clone, Default)]
pub struct HeaderRewrite {
    forwarded_user: Option<HeaderValue>,
    allow_origin: Option<HeaderValue>,
}

impl HeaderRewrite {
    pub fn from_context(ctx: &RequestContext) -> Self {
        let forwarded_user = ctx.forwarded_user().and_then(|id| {
            HeaderValue::from_str(id)
                .map_err(|_| {
                    tracing::warn!(
                        request_id = %ctx.request_id,
                        "User id is not a valid header value, not forwarding it"
                    );
                })
                .ok()
        });

        let allow_origin = if ctx.cors {
            ctx.origin
                .as_deref()
                .and_then(|origin| HeaderValue::from_str(origin).ok())
        } else {
            None
        };

        Self {
            forwarded_user,
            allow_origin,
        }
    }
}

impl ProxyHooks for HeaderRewrite {
    fn on_proxy_req(&self, headers: &mut HeaderMap) {
        match &self.forwarded_user {
            Some(id) => {
                headers.insert(X_FORWARDED_USER.clone(), id.clone());
            }
            None => {
                headers.remove(&X_FORWARDED_USER);
            }
        }
    }

    fn on_proxy_res(&self, headers: &mut HeaderMap) {
        if let Some(origin) = &self.allow_origin {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::User;
    use crate::routing::RouteCriteria;

    fn context(origin: Option<&str>, cors: bool, user: Option<User>) -> RequestContext {
        RequestContext {
            request_id: "req-1".into(),
            criteria: RouteCriteria {
                host: "app1.example.com".into(),
                url: "/".into(),
                method: "GET".into(),
                remote: "127.0.0.1".into(),
            },
            origin: origin.map(Into::into),
            cors,
            public: false,
            user,
        }
    }

    #[test]
    fn forwards_user_id() {
        let hooks = HeaderRewrite::from_context(&context(None, false, Some(User::new("user-id", "user-name"))));
        let mut headers = HeaderMap::new();

        hooks.on_proxy_req(&mut headers);

        assert_eq!(headers[&X_FORWARDED_USER], "user-id");
    }

    #[test]
    fn replaces_forged_user_header() {
        let hooks = HeaderRewrite::from_context(&context(None, false, Some(User::new("user-id", ""))));
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_USER.clone(), HeaderValue::from_static("admin"));

        hooks.on_proxy_req(&mut headers);

        assert_eq!(headers.get_all(&X_FORWARDED_USER).iter().count(), 1);
        assert_eq!(headers[&X_FORWARDED_USER], "user-id");
    }

    #[test]
    fn removes_user_header_if_unauthorized() {
        for user in [None, Some(User::default())] {
            let hooks = HeaderRewrite::from_context(&context(None, false, user));
            let mut headers = HeaderMap::new();
            headers.insert(X_FORWARDED_USER.clone(), HeaderValue::from_static("forged"));

            hooks.on_proxy_req(&mut headers);

            assert!(headers.get(&X_FORWARDED_USER).is_none());
        }
    }

    #[test]
    fn sets_cors_headers() {
        let hooks = HeaderRewrite::from_context(&context(Some("http://app2.example.com"), true, None));
        let mut headers = HeaderMap::new();

        hooks.on_proxy_res(&mut headers);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "http://app2.example.com");
    }

    #[test]
    fn does_not_set_cors_headers_to_external_origin() {
        let hooks = HeaderRewrite::from_context(&context(Some("http://external.example.com"), false, None));
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

        hooks.on_proxy_res(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
