//! Route registry: binds every configured route, plus the gateway's own
//! management routes, to the HTTP router.
//!
//! Registration is first-wins. A second route with the same
//! `"<METHOD> <path>"` pattern is skipped with a warning, as is a route whose
//! path would collide with an already registered path in the router (two
//! differently named variables in the same position, for example). Startup
//! never fails because of a duplicate.
//!
//! All methods of one path share a single router entry. A request whose
//! method has no binding on a known path is answered with 405 before any
//! authentication takes place.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use futures::future::BoxFuture;
use futures::FutureExt;

use gatekeeper_core::{Backend, Route};

use crate::context::RequestContext;
use crate::guard::{self, MethodTable};
use crate::state::GatewayState;

/// An in-process handler served under the gateway's own namespace.
pub type ApplicationHandler = Arc<
    dyn Fn(Arc<GatewayState>, RequestContext, Request<Body>) -> BoxFuture<'static, Response>
        + Send
        + Sync,
>;

/// Wrap an async function as an [`ApplicationHandler`].
pub fn application<F, Fut, R>(handler: F) -> ApplicationHandler
where
    F: Fn(Arc<GatewayState>, RequestContext, Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    Arc::new(move |state, ctx, request| {
        let fut = handler(state, ctx, request);
        async move { fut.await.into_response() }.boxed()
    })
}

/// Where an admitted request goes.
#[derive(Clone)]
pub enum RouteTarget {
    /// Forward to the route's backend.
    Backend,
    /// Serve in-process.
    Application(ApplicationHandler),
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend => f.write_str("Backend"),
            Self::Application(_) => f.write_str("Application"),
        }
    }
}

/// A registered route with everything the guard needs precomputed.
#[derive(Debug)]
pub struct RouteBinding {
    /// Owning backend, without its route list.
    pub backend: Arc<Backend>,
    /// The route.
    pub route: Arc<Route>,
    /// Backend scopes followed by route scopes.
    pub required_scopes: Vec<String>,
    /// Where admitted requests go.
    pub target: RouteTarget,
}

/// Collects route bindings in registration order.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    patterns: HashSet<String>,
    paths: Vec<String>,
    bindings: Vec<Arc<RouteBinding>>,
}

impl RouteRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every route of a configured backend as a forwarding route.
    ///
    /// Returns the number of routes actually registered.
    pub fn register_backend(&mut self, backend: &Backend) -> usize {
        let shared = Arc::new(Backend {
            routes: Vec::new(),
            ..backend.clone()
        });
        let mut registered = 0;
        for route in &backend.routes {
            if self.register(&shared, route.clone(), RouteTarget::Backend) {
                registered += 1;
            }
        }
        registered
    }

    /// Register one route. Returns `false` if it was skipped.
    pub fn register(&mut self, backend: &Arc<Backend>, route: Route, target: RouteTarget) -> bool {
        let pattern = route.pattern();
        let name = route.qualified_name(&backend.name);

        if self.patterns.contains(&pattern) {
            tracing::warn!(
                backend = %backend.name,
                route = %name,
                pattern = %pattern,
                "Route already registered, skipping"
            );
            return false;
        }

        let path = route.gatekeeper_path.clone();
        if !self.paths.contains(&path) {
            if let Some(existing) = self.paths.iter().find(|p| paths_conflict(p, &path)) {
                tracing::warn!(
                    backend = %backend.name,
                    route = %name,
                    pattern = %pattern,
                    conflicts_with = %existing,
                    "Route path conflicts with a registered path, skipping"
                );
                return false;
            }
            self.paths.push(path);
        }

        tracing::info!(
            backend = %backend.name,
            route = %name,
            pattern = %pattern,
            public = route.is_public,
            "Route registered"
        );
        self.patterns.insert(pattern);
        self.bindings.push(Arc::new(RouteBinding {
            required_scopes: backend.required_scopes(&route),
            backend: Arc::clone(backend),
            route: Arc::new(route),
            target,
        }));
        true
    }

    /// Registered bindings in registration order.
    #[must_use]
    pub fn bindings(&self) -> &[Arc<RouteBinding>] {
        &self.bindings
    }

    /// Whether `pattern` (`"<METHOD> <path>"`) is registered.
    #[must_use]
    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern)
    }

    /// Build the router: one entry per distinct path, dispatching on method.
    pub fn into_router(self, state: Arc<GatewayState>) -> Router {
        let mut tables: Vec<(String, MethodTable)> = Vec::new();
        for binding in self.bindings {
            let Ok(method) = Method::from_bytes(binding.route.method.as_bytes()) else {
                tracing::warn!(method = %binding.route.method, "Unsupported method, skipping");
                continue;
            };
            let path = &binding.route.gatekeeper_path;
            let index = match tables.iter().position(|(p, _)| p == path) {
                Some(index) => index,
                None => {
                    tables.push((path.clone(), MethodTable::new()));
                    tables.len() - 1
                }
            };
            tables[index].1.insert(method, binding);
        }

        let mut router = Router::new();
        for (path, table) in tables {
            let table = Arc::new(table);
            router = router.route(
                &path,
                any(
                    move |State(state): State<Arc<GatewayState>>,
                          params: Option<Path<HashMap<String, String>>>,
                          request: Request<Body>| {
                        let table = Arc::clone(&table);
                        async move {
                            let params = params.map(|Path(p)| p).unwrap_or_default();
                            guard::handle(state, &table, params, request).await
                        }
                    },
                ),
            );
        }
        router.with_state(state)
    }
}

/// Whether two distinct paths cannot coexist in the router.
///
/// Literal segments may sit beside a `{param}` segment, but two different
/// variables in the same position, or a catch-all beside anything else,
/// cannot.
fn paths_conflict(a: &str, b: &str) -> bool {
    let mut left = a.split('/');
    let mut right = b.split('/');
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) if x == y => {}
            (Some(x), Some(y)) => {
                return match (x.starts_with('{'), y.starts_with('{')) {
                    (false, false) => false,
                    (true, true) => true,
                    _ => x.starts_with("{*") || y.starts_with("{*"),
                };
            }
            _ => return false,
        }
    }
}
