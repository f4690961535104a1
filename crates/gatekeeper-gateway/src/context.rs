//! Per-request context handed from the auth guard to route targets.

use std::collections::HashMap;
use std::sync::Arc;

use gatekeeper_core::{Backend, RequestId, Route, UserId};

/// Header carrying the authenticated principal id to backends.
pub const GATEKEEPER_USER_HEADER: &str = "x-api-gatekeeper-user";

/// Resolved request data, built once the guard has admitted the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Backend owning the matched route.
    pub backend: Arc<Backend>,
    /// The matched route.
    pub route: Arc<Route>,
    /// Authenticated principal id. `None` on public routes.
    pub principal_id: Option<UserId>,
    /// Correlation id for this request.
    pub request_id: RequestId,
    /// Values captured from the gatekeeper path, keyed by variable name.
    pub path_params: HashMap<String, String>,
}

impl RequestContext {
    /// Captured value of the path variable `name`, if any.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}
