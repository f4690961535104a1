//! Per-request pipeline: method check, authentication, scope check, then the
//! route target.
//!
//! ```text
//! request ──► method bound? ──no──► 405
//!                 │ yes
//!                 ▼
//!             public route? ──yes──────────────────────┐
//!                 │ no                                  │
//!                 ▼                                     │
//!          authenticate_token ──err──► 401              │
//!                 │                                     │
//!                 ▼                                     │
//!          authorize(scopes) ──err──► 403               │
//!                 │                                     ▼
//!                 └────────────────────────► backend or application
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request};
use axum::response::{IntoResponse, Response};

use gatekeeper_auth::Principal;
use gatekeeper_core::RequestId;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::registry::{RouteBinding, RouteTarget};
use crate::state::GatewayState;

/// Bindings of one path, keyed by method.
pub type MethodTable = HashMap<Method, Arc<RouteBinding>>;

/// Run the pipeline for one request on a registered path.
pub async fn handle(
    state: Arc<GatewayState>,
    table: &MethodTable,
    path_params: HashMap<String, String>,
    request: Request<Body>,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = RequestId::from_headers(request.headers());

    let response = match table.get(&method) {
        Some(binding) => admit(&state, binding, request_id.clone(), path_params, request).await,
        None => ApiError::MethodNotAllowed.into_response(),
    };

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        request_id = %request_id,
        "Request handled"
    );
    response
}

async fn admit(
    state: &Arc<GatewayState>,
    binding: &RouteBinding,
    request_id: RequestId,
    path_params: HashMap<String, String>,
    request: Request<Body>,
) -> Response {
    let principal_id = if binding.route.is_public {
        None
    } else {
        match authenticate(state, binding, request.headers()).await {
            Ok(principal) => Some(principal.id),
            Err(err) => return err.into_response(),
        }
    };

    let ctx = RequestContext {
        backend: Arc::clone(&binding.backend),
        route: Arc::clone(&binding.route),
        principal_id,
        request_id,
        path_params,
    };

    match &binding.target {
        RouteTarget::Backend => state.dispatcher.forward(&ctx, request).await,
        RouteTarget::Application(handler) => handler(Arc::clone(state), ctx, request).await,
    }
}

async fn authenticate(
    state: &GatewayState,
    binding: &RouteBinding,
    headers: &HeaderMap,
) -> Result<Principal, ApiError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let principal = state.auth.authenticate_token(raw).await.map_err(|err| {
        tracing::debug!(
            error = %err,
            route = %binding.route.pattern(),
            "Authentication failed"
        );
        ApiError::from(err)
    })?;

    state
        .auth
        .authorize(&principal, &binding.required_scopes)
        .map_err(|err| {
            tracing::debug!(
                error = %err,
                user_id = %principal.id,
                route = %binding.route.pattern(),
                "Authorization failed"
            );
            ApiError::from(err)
        })?;

    Ok(principal)
}
