//! Bearer-token strategy: HS256-signed claims that embed the full principal.
//!
//! No user lookup happens at request time; the token is the identity.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::principal::Principal;
use crate::strategy::{strip_scheme, AuthStrategy, AuthType};

/// Default lifetime of issued tokens.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Claims carried by gateway-issued bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
struct BearerClaims {
    #[serde(flatten)]
    principal: Principal,
    /// Expiration timestamp (seconds since epoch).
    exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    iat: i64,
}

/// Validates and issues HS256 bearer tokens with a shared secret.
pub struct BearerStrategy {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl BearerStrategy {
    /// Create a strategy with the shared `secret` and token lifetime `ttl`.
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a signed token for `principal`, expiring after the configured lifetime.
    ///
    /// Returns the bare compact JWT, without a scheme prefix.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if signing fails.
    pub fn generate_token(&self, principal: &Principal) -> Result<String> {
        let now = Utc::now();
        let claims = BearerClaims {
            principal: principal.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

#[async_trait]
impl AuthStrategy for BearerStrategy {
    fn kind(&self) -> AuthType {
        AuthType::Jwt
    }

    async fn authenticate_token(&self, raw: &str) -> Result<Principal> {
        let token = strip_scheme(raw, "Bearer");
        if token.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let data = decode::<BearerClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::InvalidToken(e.to_string()),
            },
        )?;

        Ok(data.claims.principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeeper_core::UserId;

    fn principal() -> Principal {
        Principal {
            id: UserId::generate(),
            login: "alice".to_string(),
            scopes: vec!["orders.read".to_string(), "billing.read".to_string()],
        }
    }

    #[tokio::test]
    async fn issued_token_roundtrips_principal() {
        let strategy = BearerStrategy::new("secret", Duration::minutes(30));
        let p = principal();
        let token = strategy.generate_token(&p).unwrap();

        let with_prefix = strategy
            .authenticate_token(&format!("Bearer {token}"))
            .await
            .unwrap();
        assert_eq!(with_prefix, p);

        let without_prefix = strategy.authenticate_token(&token).await.unwrap();
        assert_eq!(without_prefix, p);
    }

    #[tokio::test]
    async fn empty_header() {
        let strategy = BearerStrategy::new("secret", Duration::minutes(30));
        let err = strategy.authenticate_token("Bearer ").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }

    #[tokio::test]
    async fn expired_token() {
        let issuer = BearerStrategy::new("secret", Duration::seconds(-10));
        let token = issuer.generate_token(&principal()).unwrap();

        let err = issuer.authenticate_token(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(err.http_status_code(), 401);
    }

    #[tokio::test]
    async fn wrong_secret() {
        let issuer = BearerStrategy::new("secret", Duration::minutes(30));
        let other = BearerStrategy::new("other-secret", Duration::minutes(30));
        let token = issuer.generate_token(&principal()).unwrap();

        let err = other.authenticate_token(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[tokio::test]
    async fn garbage_token() {
        let strategy = BearerStrategy::new("secret", Duration::minutes(30));
        let err = strategy
            .authenticate_token("Bearer not.a.jwt")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
