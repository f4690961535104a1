//! Storage record types.

use chrono::{DateTime, Utc};
use gatekeeper_core::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A gateway-managed user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user.
    pub user_id: UserId,
    /// Unique login name.
    pub login: String,
    /// bcrypt hash of the password.
    pub password_hash: String,
    /// Free-form user attributes.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}
