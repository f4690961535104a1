//! User management endpoints.
//!
//! All of these sit behind the `api-gatekeeper.manage-users` scope.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use gatekeeper_users::{CreateUserRequest, UpdateUserRequest};

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::handlers::read_json;
use crate::state::GatewayState;

/// Path variable naming the user in `/v1/users/{userId}`.
pub const USER_ID_PARAM: &str = "userId";

/// `POST /api-gatekeeper/v1/users`
pub async fn create_user(
    state: Arc<GatewayState>,
    _ctx: RequestContext,
    request: Request<Body>,
) -> Result<impl IntoResponse, ApiError> {
    let body: CreateUserRequest = read_json(request, state.config.max_body_bytes).await?;
    let user = state.users.create(body).await?;
    tracing::info!(user_id = %user.id, login = %user.login, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api-gatekeeper/v1/users`
pub async fn list_users(
    state: Arc<GatewayState>,
    _ctx: RequestContext,
    _request: Request<Body>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.users.get_all().await?))
}

/// `GET /api-gatekeeper/v1/users/{userId}`
pub async fn get_user(
    state: Arc<GatewayState>,
    ctx: RequestContext,
    _request: Request<Body>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ctx.path_param(USER_ID_PARAM).unwrap_or_default();
    Ok(Json(state.users.get_by_id(id).await?))
}

/// `PUT /api-gatekeeper/v1/users/{userId}`
pub async fn update_user(
    state: Arc<GatewayState>,
    ctx: RequestContext,
    request: Request<Body>,
) -> Result<impl IntoResponse, ApiError> {
    let body: UpdateUserRequest = read_json(request, state.config.max_body_bytes).await?;
    let id = ctx.path_param(USER_ID_PARAM).unwrap_or_default();
    let user = state.users.update(id, body).await?;
    tracing::info!(user_id = %user.id, "User updated");
    Ok(Json(user))
}

/// `DELETE /api-gatekeeper/v1/users/{userId}`
pub async fn delete_user(
    state: Arc<GatewayState>,
    ctx: RequestContext,
    _request: Request<Body>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ctx.path_param(USER_ID_PARAM).unwrap_or_default();
    state.users.delete(id).await?;
    tracing::info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
