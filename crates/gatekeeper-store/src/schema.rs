//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary user records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Index: user id by login, keyed by the login bytes.
    pub const USERS_BY_LOGIN: &str = "users_by_login";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::USERS, cf::USERS_BY_LOGIN]
}
