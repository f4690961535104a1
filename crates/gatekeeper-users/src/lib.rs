//! Gateway-managed user accounts for api-gatekeeper.
//!
//! This crate owns the business rules for users the gateway authenticates
//! itself: creation with bcrypt-hashed passwords, updates, deletion, lookup,
//! and password login. It also implements [`gatekeeper_auth::UserLookup`] so
//! the Basic strategy can authenticate against the same records.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Gateway (management routes, Basic auth)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        UserService                          │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │   User      │ │  Password   │ │    UserLookup       │    │
//! │  │   CRUD      │ │  login      │ │    (auth seam)      │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                        ┌──────────┐
//!                        │  Store   │
//!                        │ (RocksDB)│
//!                        └──────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use gatekeeper_store::RocksStore;
//! use gatekeeper_users::{CreateUserRequest, UserManagement, UserService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/api-gatekeeper")?);
//! let users = UserService::with_defaults(store);
//!
//! users.create_application_user("admin", "change-me").await?;
//!
//! let user = users
//!     .create(CreateUserRequest {
//!         login: "alice".to_string(),
//!         password: "hunter2".to_string(),
//!         scopes: vec!["orders.read".to_string()],
//!         ..CreateUserRequest::default()
//!     })
//!     .await?;
//! println!("Created user: {}", user.id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod service;
pub mod types;

pub use error::{Result, UserError};
pub use service::{UserManagement, UserService};
pub use types::{
    CreateUserRequest, UpdateUserRequest, UserView, UsersConfig, APPLICATION_SCOPE,
    MANAGE_USERS_SCOPE,
};
