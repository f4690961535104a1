//! The gateway's own routes under `/api-gatekeeper`.
//!
//! They are registered through the same [`RouteRegistry`] as configured
//! backends, so they pass through the same guard. User management requires
//! the `api-gatekeeper.manage-users` scope; login and health are public.

use std::sync::Arc;

use gatekeeper_core::{Backend, Route, RESERVED_NAMESPACE};
use gatekeeper_users::MANAGE_USERS_SCOPE;

use crate::handlers::{health, login, users};
use crate::registry::{application, ApplicationHandler, RouteRegistry, RouteTarget};

/// Name of the built-in management backend.
pub const MANAGEMENT_BACKEND: &str = "api-gatekeeper";

const HANDLER_TIMEOUT_SECONDS: u64 = 30;

/// The built-in backend owning the management routes.
#[must_use]
pub fn management_backend() -> Backend {
    Backend {
        name: MANAGEMENT_BACKEND.to_string(),
        scopes: vec![MANAGE_USERS_SCOPE.to_string()],
        ..Backend::default()
    }
}

/// Register every management route. Returns the number registered.
pub fn register(registry: &mut RouteRegistry) -> usize {
    let protected = Arc::new(management_backend());
    let public = Arc::new(Backend {
        scopes: Vec::new(),
        ..management_backend()
    });

    let routes: [(&Arc<Backend>, &str, &str, ApplicationHandler); 7] = [
        (&protected, "POST", "/v1/users", application(users::create_user)),
        (&protected, "GET", "/v1/users", application(users::list_users)),
        (&protected, "GET", "/v1/users/{userId}", application(users::get_user)),
        (&protected, "PUT", "/v1/users/{userId}", application(users::update_user)),
        (&protected, "DELETE", "/v1/users/{userId}", application(users::delete_user)),
        (&public, "POST", "/v1/login", application(login::login)),
        (&public, "GET", "/health", application(|state, _, _| health::health(state))),
    ];

    let mut registered = 0;
    for (backend, method, path, handler) in routes {
        let route = Route {
            method: method.to_string(),
            gatekeeper_path: format!("{RESERVED_NAMESPACE}{path}"),
            timeout_seconds: HANDLER_TIMEOUT_SECONDS,
            is_public: backend.scopes.is_empty(),
            ..Route::default()
        };
        if registry.register(backend, route, RouteTarget::Application(handler)) {
            registered += 1;
        }
    }
    registered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_routes() {
        let mut registry = RouteRegistry::new();
        assert_eq!(register(&mut registry), 7);
        assert!(registry.contains("GET /api-gatekeeper/health"));
        assert!(registry.contains("DELETE /api-gatekeeper/v1/users/{userId}"));
    }

    #[test]
    fn only_login_and_health_are_public() {
        let mut registry = RouteRegistry::new();
        register(&mut registry);
        let public: Vec<String> = registry
            .bindings()
            .iter()
            .filter(|b| b.route.is_public)
            .map(|b| b.route.pattern())
            .collect();
        assert_eq!(
            public,
            vec!["POST /api-gatekeeper/v1/login", "GET /api-gatekeeper/health"]
        );
        for binding in registry.bindings().iter().filter(|b| !b.route.is_public) {
            assert_eq!(binding.required_scopes, vec![MANAGE_USERS_SCOPE]);
        }
    }
}
