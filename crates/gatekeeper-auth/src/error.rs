//! Authentication and authorization error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication or authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential was supplied.
    #[error("missing Authorization token")]
    MissingCredentials,

    /// The credential could not be decoded.
    #[error("malformed credentials: {0}")]
    MalformedCredentials(String),

    /// Unknown login or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The bearer token has expired.
    #[error("token expired")]
    TokenExpired,

    /// The bearer token signature is invalid.
    #[error("invalid signature")]
    InvalidSignature,

    /// The bearer token format is invalid.
    #[error("invalid token format: {0}")]
    InvalidToken(String),

    /// The principal lacks a required scope.
    #[error("missing {0} scope")]
    MissingScope(String),

    /// The user-lookup collaborator failed.
    #[error("user lookup failed: {0}")]
    Lookup(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingCredentials
            | Self::MalformedCredentials(_)
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::InvalidSignature
            | Self::InvalidToken(_)
            | Self::Lookup(_) => 401,
            Self::MissingScope(_) => 403,
            Self::Internal(_) => 500,
        }
    }
}
