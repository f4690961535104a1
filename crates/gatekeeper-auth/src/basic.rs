//! Basic-credential strategy: `base64(login:password)` checked against stored users.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{AuthError, Result};
use crate::principal::{Principal, UserLookup};
use crate::strategy::{strip_scheme, AuthStrategy, AuthType};

/// Authenticates `Authorization: Basic ...` headers against a [`UserLookup`].
pub struct BasicStrategy<L: UserLookup> {
    users: L,
}

impl<L: UserLookup> BasicStrategy<L> {
    /// Create a strategy backed by `users`.
    #[must_use]
    pub const fn new(users: L) -> Self {
        Self { users }
    }
}

/// Decode a Basic credential into `(login, password)`.
///
/// Splits on the first `:` so passwords may contain colons.
///
/// # Errors
///
/// Returns `AuthError::MissingCredentials` for an empty value and
/// `AuthError::MalformedCredentials` when decoding or splitting fails.
pub fn decode_basic(raw: &str) -> Result<(String, String)> {
    let encoded = strip_scheme(raw, "Basic");
    if encoded.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| AuthError::MalformedCredentials("invalid base64".to_string()))?;
    let decoded = String::from_utf8(bytes)
        .map_err(|_| AuthError::MalformedCredentials("invalid utf-8".to_string()))?;

    let (login, password) = decoded
        .split_once(':')
        .ok_or_else(|| AuthError::MalformedCredentials("expected login:password".to_string()))?;
    Ok((login.to_string(), password.to_string()))
}

#[async_trait]
impl<L: UserLookup> AuthStrategy for BasicStrategy<L> {
    fn kind(&self) -> AuthType {
        AuthType::Basic
    }

    async fn authenticate_token(&self, raw: &str) -> Result<Principal> {
        let (login, password) = decode_basic(raw)?;

        let credentials = match self.users.get_by_login(&login).await {
            Ok(Some(c)) => c,
            Ok(None) => return Err(AuthError::InvalidCredentials),
            Err(e) => {
                tracing::error!(error = %e, "User lookup failed during authentication");
                return Err(e);
            }
        };

        let hash = credentials.password_hash;
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        match verified {
            Ok(true) => Ok(credentials.principal),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                tracing::warn!(login = %login, error = %e, "Stored password hash is unusable");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Credentials;
    use gatekeeper_core::UserId;
    use std::collections::HashMap;

    struct StaticUsers(HashMap<String, Credentials>);

    #[async_trait]
    impl UserLookup for StaticUsers {
        async fn get_by_login(&self, login: &str) -> Result<Option<Credentials>> {
            if login == "broken" {
                return Err(AuthError::Lookup("disk on fire".to_string()));
            }
            Ok(self.0.get(login).cloned())
        }
    }

    fn strategy() -> BasicStrategy<StaticUsers> {
        let principal = Principal {
            id: UserId::generate(),
            login: "alice".to_string(),
            scopes: vec!["orders.read".to_string()],
        };
        let credentials = Credentials {
            principal,
            password_hash: bcrypt::hash("s3:cret", 4).unwrap(),
        };
        BasicStrategy::new(StaticUsers(HashMap::from([(
            "alice".to_string(),
            credentials,
        )])))
    }

    fn basic(login_password: &str) -> String {
        format!("Basic {}", STANDARD.encode(login_password))
    }

    #[tokio::test]
    async fn valid_credentials() {
        let p = strategy()
            .authenticate_token(&basic("alice:s3:cret"))
            .await
            .unwrap();
        assert_eq!(p.login, "alice");
        assert!(p.has_scope("orders.read"));
    }

    #[tokio::test]
    async fn prefix_is_optional() {
        let raw = STANDARD.encode("alice:s3:cret");
        assert!(strategy().authenticate_token(&raw).await.is_ok());
    }

    #[tokio::test]
    async fn empty_header() {
        let err = strategy().authenticate_token("").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
        let err = strategy().authenticate_token("Basic ").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }

    #[tokio::test]
    async fn undecodable_header() {
        let err = strategy()
            .authenticate_token("Basic !!!not-base64")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MalformedCredentials(_)));
    }

    #[tokio::test]
    async fn missing_separator() {
        let err = strategy()
            .authenticate_token(&basic("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MalformedCredentials(_)));
    }

    #[tokio::test]
    async fn unknown_login_and_wrong_password() {
        let err = strategy()
            .authenticate_token(&basic("bob:s3:cret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = strategy()
            .authenticate_token(&basic("alice:wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.http_status_code(), 401);
    }

    #[tokio::test]
    async fn lookup_failure_is_unauthorized() {
        let err = strategy()
            .authenticate_token(&basic("broken:x"))
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 401);
    }
}
