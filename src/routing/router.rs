//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request criteria
//! - Return matched decision or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in priority order (acceptable for typical route counts)
//! - Explicit `None` rather than silent default

use async_trait::async_trait;

use crate::config::RouteConfig;
use crate::error::GatewayError;
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};
use crate::routing::{RouteCriteria, RouteDecision};

/// Resolves routing criteria to an app and upstream target.
#[async_trait]
pub trait Router: Send + Sync + std::fmt::Debug {
    /// Resolve a request. `Ok(None)` means no app claims it.
    async fn route(&self, criteria: &RouteCriteria) -> Result<Option<RouteDecision>, GatewayError>;
}

#[derive(Debug)]
struct CompiledRoute {
    name: String,
    matcher: AndMatcher,
    decision: RouteDecision,
}

/// A router compiled from static route configuration.
#[derive(Debug)]
pub struct StaticRouter {
    routes: Vec<CompiledRoute>,
}

impl StaticRouter {
    /// Compile routes. Higher priority first; ties keep config order.
    pub fn from_config(mut routes: Vec<RouteConfig>) -> Self {
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));

        let routes = routes
            .into_iter()
            .map(|route| {
                let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
                if let Some(host) = &route.host {
                    matchers.push(Box::new(HostMatcher::new(host)));
                }
                if let Some(prefix) = &route.path_prefix {
                    matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
                }

                CompiledRoute {
                    name: route.name,
                    matcher: AndMatcher::new(matchers),
                    decision: RouteDecision {
                        app: route.app,
                        target: route.target,
                        public: route.public,
                    },
                }
            })
            .collect();

        Self { routes }
    }

    /// Number of compiled routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl Router for StaticRouter {
    async fn route(&self, criteria: &RouteCriteria) -> Result<Option<RouteDecision>, GatewayError> {
        let matched = self
            .routes
            .iter()
            .find(|route| route.matcher.matches(criteria));

        if let Some(route) = matched {
            tracing::trace!(route = %route.name, host = %criteria.host, "Route matched");
        }

        Ok(matched.map(|route| route.decision.clone()))
    }
}
