//! Request and response types for user management.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gatekeeper_core::UserId;
use gatekeeper_store::User;
use serde::{Deserialize, Serialize};

/// Scope granted to the bootstrap application user.
pub const APPLICATION_SCOPE: &str = "api-gatekeeper.application";

/// Scope required by every management route.
pub const MANAGE_USERS_SCOPE: &str = "api-gatekeeper.manage-users";

/// Configuration for the user service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersConfig {
    /// bcrypt work factor for new password hashes.
    #[serde(default = "UsersConfig::default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: Self::default_bcrypt_cost(),
        }
    }
}

impl UsersConfig {
    const fn default_bcrypt_cost() -> u32 {
        bcrypt::DEFAULT_COST
    }
}

/// Request to create a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Unique login name.
    #[serde(default)]
    pub login: String,
    /// Plain-text password, hashed before storage.
    #[serde(default)]
    pub password: String,
    /// Free-form attributes.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Request to replace a user's attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    /// New login name.
    #[serde(default)]
    pub login: String,
    /// New password; the stored hash is kept when absent.
    #[serde(default)]
    pub password: Option<String>,
    /// Replacement attributes.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Replacement scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// A user as returned to API callers. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// User identifier.
    pub id: UserId,
    /// Login name.
    pub login: String,
    /// Free-form attributes.
    pub properties: BTreeMap<String, String>,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.user_id,
            login: user.login,
            properties: user.properties,
            scopes: user.scopes,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
