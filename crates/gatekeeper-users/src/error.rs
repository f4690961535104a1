//! Error types for user management.

use gatekeeper_core::UserId;
use thiserror::Error;

/// A result type using `UserError`.
pub type Result<T> = std::result::Result<T, UserError>;

/// Errors that can occur in user management operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// A request parameter is missing or malformed.
    #[error("badparams: {0}")]
    BadParams(String),

    /// The login is already taken.
    #[error("user with login '{0}' already exists")]
    AlreadyExists(String),

    /// The requested user was not found.
    #[error("user not found: {0}")]
    NotFound(UserId),

    /// Login and password do not match a stored user.
    #[error("invalid login or password")]
    InvalidCredentials,

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] gatekeeper_store::StoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl UserError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::BadParams(_) => 400,
            Self::InvalidCredentials => 401,
            Self::NotFound(_) => 404,
            Self::AlreadyExists(_) => 422,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }

    pub(crate) fn blank(field: &str) -> Self {
        Self::BadParams(format!(
            "{field} parameter must be present and must not be blank"
        ))
    }
}
