//! HTTP request handlers for the gateway's own namespace.
//!
//! Every handler here is served in-process under `/api-gatekeeper` and is
//! wired up by [`crate::management`].

pub mod health;
pub mod login;
pub mod users;

use axum::body::Body;
use axum::http::Request;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Read and parse a JSON request body, capped at `limit` bytes.
pub(crate) async fn read_json<T: DeserializeOwned>(
    request: Request<Body>,
    limit: usize,
) -> Result<T, ApiError> {
    let bytes = axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|_| ApiError::BadRequest("failed to read request body".to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        tracing::debug!(error = %err, "Rejected request body");
        ApiError::BadRequest("failed to parse request body".to_string())
    })
}
