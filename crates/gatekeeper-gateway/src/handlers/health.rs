//! `GET /api-gatekeeper/health`.

use std::sync::Arc;

use axum::Json;
use gatekeeper_auth::AuthType;
use serde::Serialize;

use crate::state::GatewayState;

/// Liveness report. Public; never touches the user store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `healthy` when the process can answer.
    pub status: &'static str,
    /// Crate version of the running binary.
    pub version: &'static str,
    /// Strategy guarding protected routes.
    pub auth_type: AuthType,
    /// Whether `POST /v1/login` can mint bearer tokens.
    pub token_issuance: bool,
}

/// Report status along with how this instance authenticates.
pub async fn health(state: Arc<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        auth_type: state.auth.kind(),
        token_issuance: state.token_issuer.is_some(),
    })
}
