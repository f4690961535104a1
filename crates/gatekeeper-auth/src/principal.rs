//! Authenticated identities and the user-lookup seam.

use async_trait::async_trait;
use gatekeeper_core::UserId;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User identifier, sent to backends in the identity header.
    pub id: UserId,
    /// Login name.
    pub login: String,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Principal {
    /// Whether `scope` is granted.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// A principal together with its stored password hash.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// The identity the credentials belong to.
    pub principal: Principal,
    /// bcrypt hash of the password.
    pub password_hash: String,
}

/// Looks up users by login on behalf of the Basic strategy.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// Find the credentials for `login`. An unknown login is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Lookup` if the backing store fails.
    async fn get_by_login(&self, login: &str) -> Result<Option<Credentials>>;
}

#[async_trait]
impl<T: UserLookup + ?Sized> UserLookup for std::sync::Arc<T> {
    async fn get_by_login(&self, login: &str) -> Result<Option<Credentials>> {
        (**self).get_by_login(login).await
    }
}
