//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use gatekeeper_core::{Backend, GATEKEEPER_REQUEST_ID_HEADER};

use crate::error::ApiError;
use crate::management;
use crate::registry::RouteRegistry;
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// Configured backends are registered first, in declaration order, then the
/// gateway's own routes:
///
/// ## Public
/// - `GET /api-gatekeeper/health` - Health check
/// - `POST /api-gatekeeper/v1/login` - Password login
///
/// ## Users (`api-gatekeeper.manage-users`)
/// - `GET /api-gatekeeper/v1/users` - List users
/// - `POST /api-gatekeeper/v1/users` - Create user
/// - `GET /api-gatekeeper/v1/users/{userId}` - Get user
/// - `PUT /api-gatekeeper/v1/users/{userId}` - Update user
/// - `DELETE /api-gatekeeper/v1/users/{userId}` - Delete user
pub fn create_router(state: Arc<GatewayState>, backends: &[Backend]) -> Router {
    let mut registry = RouteRegistry::new();
    for backend in backends {
        let registered = registry.register_backend(backend);
        tracing::info!(
            backend = %backend.name,
            routes = registered,
            declared = backend.routes.len(),
            "Backend registered"
        );
    }
    management::register(&mut registry);

    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;

    let router = registry
        .into_router(state)
        .fallback(|| async { ApiError::NotFound("Not found".to_string()) })
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes));

    if cors_origins.is_empty() {
        router
    } else {
        router.layer(build_cors_layer(&cors_origins))
    }
}

/// CORS for browser callers. `*` opens every origin; otherwise only the
/// listed origins are echoed back, and entries that are not valid header
/// values are skipped with a warning.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!(origin = %origin, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(GATEKEEPER_REQUEST_ID_HEADER)])
}
