//! `RocksDB` storage layer for api-gatekeeper.
//!
//! This crate persists gateway-managed users using `RocksDB` with column
//! families for indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `users`: Primary user records, keyed by `user_id`
//! - `users_by_login`: Index from login to `user_id`, enforces unique logins
//!
//! # Example
//!
//! ```no_run
//! use gatekeeper_store::{RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/api-gatekeeper-db").unwrap();
//! let admin = store.get_user_by_login("admin").unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::User;

use gatekeeper_core::UserId;

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a new user record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the login or id is taken.
    fn insert_user(&self, user: &User) -> Result<()>;

    /// Insert or update a user record.
    ///
    /// Keeps the login index in sync when the login changes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the new login belongs to another user.
    fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Get a user by login.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user_by_login(&self, login: &str) -> Result<Option<User>>;

    /// Delete a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn delete_user(&self, user_id: &UserId) -> Result<()>;

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_users(&self) -> Result<Vec<User>>;
}
