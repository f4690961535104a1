//! Password login.
//!
//! `POST /api-gatekeeper/v1/login` takes Basic credentials. With
//! `X-Token-Type: jwt` it answers with a signed bearer token; otherwise it
//! returns the authenticated principal.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use gatekeeper_auth::decode_basic;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::state::GatewayState;

/// Header selecting the login response format.
pub const TOKEN_TYPE_HEADER: &str = "x-token-type";

/// Bearer token issued on login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// `Bearer <jwt>`, ready to send as an `Authorization` header.
    pub token: String,
}

/// Login handler.
pub async fn login(
    state: Arc<GatewayState>,
    _ctx: RequestContext,
    request: Request<Body>,
) -> Result<Response, ApiError> {
    let headers = request.headers();
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let wants_token = headers
        .get(TOKEN_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("jwt"));

    let (login, password) = decode_basic(raw).map_err(|err| {
        tracing::debug!(error = %err, "Login rejected");
        ApiError::Unauthorized
    })?;
    let principal = state.users.login(&login, &password).await?;
    tracing::info!(user_id = %principal.id, login = %principal.login, "User logged in");

    if !wants_token {
        return Ok(Json(principal).into_response());
    }
    let issuer = state.token_issuer.as_ref().ok_or_else(|| {
        ApiError::BadRequest("jwt tokens are not enabled on this gateway".to_string())
    })?;
    let token = issuer.generate_token(&principal)?;
    Ok(Json(TokenResponse {
        token: format!("Bearer {token}"),
    })
    .into_response())
}
