//! The authentication strategy contract shared by every variant.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::principal::Principal;

/// Which strategy a gateway instance runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// `Authorization: Basic base64(login:password)` checked against stored users.
    Basic,
    /// `Authorization: Bearer <jwt>` carrying the principal in signed claims.
    Jwt,
}

impl AuthType {
    /// Every supported value, as written in config.
    pub const ALL: [Self; 2] = [Self::Basic, Self::Jwt];

    /// Config spelling of this value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Jwt => "jwt",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a raw `Authorization` header value into a principal and checks scopes.
///
/// One implementation is selected at startup and shared by every request.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// The variant this strategy implements.
    fn kind(&self) -> AuthType;

    /// Authenticate the raw `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns an authentication error (401 class) when the credential is
    /// missing, malformed, unknown, or does not verify.
    async fn authenticate_token(&self, raw: &str) -> Result<Principal>;

    /// Check that `principal` holds every scope in `required`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingScope` naming the first missing scope.
    fn authorize(&self, principal: &Principal, required: &[String]) -> Result<()> {
        authorize_scopes(principal, required)
    }
}

/// Set-membership scope check, short-circuiting on the first missing scope.
///
/// Duplicate entries in `required` are tolerated. An empty `required` always
/// succeeds.
///
/// # Errors
///
/// Returns `AuthError::MissingScope` naming the first missing scope.
pub fn authorize_scopes(principal: &Principal, required: &[String]) -> Result<()> {
    match required.iter().find(|scope| !principal.has_scope(scope)) {
        Some(missing) => Err(AuthError::MissingScope(missing.clone())),
        None => Ok(()),
    }
}

/// Strip an optional, case-insensitive scheme prefix such as `Basic` or `Bearer`.
pub(crate) fn strip_scheme<'a>(raw: &'a str, scheme: &str) -> &'a str {
    let raw = raw.trim();
    let n = scheme.len();
    match (raw.get(..n), raw.get(n..)) {
        (Some(head), Some(rest)) if head.eq_ignore_ascii_case(scheme) => rest.trim_start(),
        _ => raw,
    }
}

/// A mock strategy for testing.
///
/// Accepts tokens of the form `test-token:<login>:<scope>,<scope>` (optionally
/// prefixed with `Bearer `) and counts how often each operation is invoked.
/// Every principal it produces carries [`MockAuthStrategy::user_id`].
#[cfg(any(test, feature = "test-utils"))]
pub struct MockAuthStrategy {
    /// Id assigned to every authenticated principal.
    pub user_id: gatekeeper_core::UserId,
    authenticate_calls: std::sync::atomic::AtomicUsize,
    authorize_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockAuthStrategy {
    fn default() -> Self {
        Self {
            user_id: gatekeeper_core::UserId::generate(),
            authenticate_calls: std::sync::atomic::AtomicUsize::new(0),
            authorize_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl MockAuthStrategy {
    /// Number of `authenticate_token` calls so far.
    #[must_use]
    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Number of `authorize` calls so far.
    #[must_use]
    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl AuthStrategy for MockAuthStrategy {
    fn kind(&self) -> AuthType {
        AuthType::Jwt
    }

    async fn authenticate_token(&self, raw: &str) -> Result<Principal> {
        self.authenticate_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let token = strip_scheme(raw, "Bearer");
        if token.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let rest = token.strip_prefix("test-token:").ok_or_else(|| {
            AuthError::InvalidToken("expected test-token:<login>:<scopes>".to_string())
        })?;
        let (login, scopes) = rest.split_once(':').unwrap_or((rest, ""));

        Ok(Principal {
            id: self.user_id,
            login: login.to_string(),
            scopes: scopes
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    fn authorize(&self, principal: &Principal, required: &[String]) -> Result<()> {
        self.authorize_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        authorize_scopes(principal, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeeper_core::UserId;

    fn principal(scopes: &[&str]) -> Principal {
        Principal {
            id: UserId::generate(),
            login: "alice".to_string(),
            scopes: scopes.iter().map(ToString::to_string).collect(),
        }
    }

    fn scopes(s: &[&str]) -> Vec<String> {
        s.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_requirement_always_succeeds() {
        assert!(authorize_scopes(&principal(&[]), &[]).is_ok());
    }

    #[test]
    fn subset_succeeds_in_any_order() {
        let p = principal(&["a", "b", "c"]);
        assert!(authorize_scopes(&p, &scopes(&["c", "a"])).is_ok());
    }

    #[test]
    fn duplicates_are_tolerated() {
        let p = principal(&["orders.read"]);
        assert!(authorize_scopes(&p, &scopes(&["orders.read", "orders.read"])).is_ok());
    }

    #[test]
    fn names_first_missing_scope() {
        let p = principal(&["orders.read"]);
        let err = authorize_scopes(&p, &scopes(&["orders.read", "billing.read", "x"]))
            .unwrap_err();
        assert!(matches!(&err, AuthError::MissingScope(s) if s == "billing.read"));
        assert_eq!(err.to_string(), "missing billing.read scope");
        assert_eq!(err.http_status_code(), 403);
    }

    #[test]
    fn strip_scheme_is_optional() {
        assert_eq!(strip_scheme("Basic abc", "Basic"), "abc");
        assert_eq!(strip_scheme("  abc ", "Basic"), "abc");
        assert_eq!(strip_scheme("Bearer", "Bearer"), "");
        assert_eq!(strip_scheme("bearer xyz", "Bearer"), "xyz");
    }

    #[test]
    fn auth_type_serde() {
        let t: AuthType = serde_json::from_str("\"jwt\"").unwrap();
        assert_eq!(t, AuthType::Jwt);
        assert_eq!(AuthType::Basic.to_string(), "basic");
        assert!(serde_json::from_str::<AuthType>("\"oauth\"").is_err());
    }

    #[tokio::test]
    async fn mock_strategy_counts_calls() {
        let mock = MockAuthStrategy::default();
        let p = mock
            .authenticate_token("Bearer test-token:alice:orders.read,billing.read")
            .await
            .unwrap();
        assert_eq!(p.id, mock.user_id);
        assert_eq!(p.scopes, vec!["orders.read", "billing.read"]);
        assert!(mock.authorize(&p, &scopes(&["billing.read"])).is_ok());

        assert!(mock.authenticate_token("").await.is_err());
        assert_eq!(mock.authenticate_calls(), 2);
        assert_eq!(mock.authorize_calls(), 1);
    }
}
