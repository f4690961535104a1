//! Core identifier types for api-gatekeeper.
//!
//! This module provides strongly-typed identifiers for gateway-managed users
//! and for per-request correlation.

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-supplied correlation header, checked first.
pub const REQUEST_ID_HEADER: &str = "x-requestid";

/// Gateway correlation header. Accepted from callers as a fallback and always
/// sent to backends.
pub const GATEKEEPER_REQUEST_ID_HEADER: &str = "x-api-gatekeeper-requestid";

/// A 16-byte user identifier based on UUID v4.
///
/// User IDs are generated when a gateway-managed user is created and are
/// embedded in bearer tokens.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(uuid::Uuid);

impl UserId {
    /// Create a new `UserId` from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random `UserId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Return the bytes of the UUID.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Rebuild a `UserId` from its 16 raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 16 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        let uuid = uuid::Uuid::from_slice(bytes).map_err(|_| IdError::InvalidLength {
            expected: 16,
            got: bytes.len(),
        })?;
        Ok(Self(uuid))
    }
}

impl FromStr for UserId {
    type Err = IdError;

    /// Parse a `UserId` from a UUID string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s.trim()).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0.to_string()
    }
}

impl AsRef<[u8]> for UserId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Correlation id for one inbound request.
///
/// Callers may supply their own value, so this is an opaque string rather
/// than a UUID.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh random request id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Resolve the correlation id for a request.
    ///
    /// Uses `X-RequestId` when present and non-blank, else
    /// `X-Api-Gatekeeper-RequestId`, else a freshly generated id.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        [REQUEST_ID_HEADER, GATEKEEPER_REQUEST_ID_HEADER]
            .iter()
            .find_map(|name| {
                headers
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| Self(v.to_string()))
            })
            .unwrap_or_else(Self::generate)
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input has an incorrect length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// The expected number of bytes.
        expected: usize,
        /// The actual number of bytes.
        got: usize,
    },

    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn user_id_roundtrip() {
        let id = UserId::generate();
        let parsed = UserId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn user_id_bytes_roundtrip() {
        let id = UserId::generate();
        let parsed = UserId::from_slice(id.as_bytes()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn user_id_wrong_length() {
        let result = UserId::from_slice(&[1, 2, 3]);
        assert!(matches!(
            result,
            Err(IdError::InvalidLength {
                expected: 16,
                got: 3
            })
        ));
    }

    #[test]
    fn user_id_invalid_uuid() {
        let result = UserId::from_str("not-a-uuid");
        assert!(matches!(result, Err(IdError::InvalidUuid)));
    }

    #[test]
    fn user_id_serde_json() {
        let id = UserId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn request_id_prefers_x_requestid() {
        let mut headers = HeaderMap::new();
        headers.insert("X-RequestId", HeaderValue::from_static("caller-1"));
        headers.insert(
            "X-Api-Gatekeeper-RequestId",
            HeaderValue::from_static("gw-1"),
        );
        assert_eq!(RequestId::from_headers(&headers).as_str(), "caller-1");
    }

    #[test]
    fn request_id_falls_back_to_gatekeeper_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-RequestId", HeaderValue::from_static("   "));
        headers.insert(
            "X-Api-Gatekeeper-RequestId",
            HeaderValue::from_static("gw-1"),
        );
        assert_eq!(RequestId::from_headers(&headers).as_str(), "gw-1");
    }

    #[test]
    fn request_id_generated_when_absent() {
        let headers = HeaderMap::new();
        let a = RequestId::from_headers(&headers);
        let b = RequestId::from_headers(&headers);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
        assert_ne!(a, b);
    }
}
