//! API error types and responses.
//!
//! Every gateway-originated error is rendered as `{"message": "..."}` with a
//! matching status code. Internal failures are logged where they are
//! converted and surface to callers only as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatekeeper_auth::AuthError;
use gatekeeper_users::UserError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request body or parameters.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// The caller lacks a required scope.
    #[error("You do not have the scopes to access this resource")]
    Forbidden,

    /// The requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The request is well-formed but conflicts with stored state.
    #[error("{0}")]
    Unprocessable(String),

    /// Internal server error.
    #[error("Internal server error")]
    Internal,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials
            | AuthError::MalformedCredentials(_)
            | AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::InvalidSignature
            | AuthError::InvalidToken(_)
            | AuthError::Lookup(_) => Self::Unauthorized,
            AuthError::MissingScope(_) => Self::Forbidden,
            AuthError::Internal(_) => {
                tracing::error!(error = %err, "Auth internal error");
                Self::Internal
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::BadParams(msg) => Self::BadRequest(msg),
            UserError::AlreadyExists(_) => Self::Unprocessable(err.to_string()),
            UserError::NotFound(_) => Self::NotFound(err.to_string()),
            UserError::InvalidCredentials => Self::Unauthorized,
            UserError::Store(_) | UserError::Internal(_) => {
                tracing::error!(error = %err, "User service error");
                Self::Internal
            }
        }
    }
}
