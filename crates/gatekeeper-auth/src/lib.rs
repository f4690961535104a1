//! Authentication and authorization for api-gatekeeper.
//!
//! This crate provides the pluggable [`AuthStrategy`] contract and its two
//! variants:
//!
//! - [`BasicStrategy`]: `base64(login:password)` verified with bcrypt against a
//!   [`UserLookup`]
//! - [`BearerStrategy`]: HS256-signed tokens embedding the full [`Principal`]
//!
//! Both share the same scope check ([`authorize_scopes`]).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Gateway        │────▶│   AuthStrategy   │
//! │   (guard)        │     │   (trait)        │
//! └──────────────────┘     └────────┬─────────┘
//!                         ┌─────────┴──────────┐
//!                ┌────────▼─────────┐ ┌────────▼─────────┐
//!                │  BasicStrategy   │ │  BearerStrategy  │
//!                │  (bcrypt)        │ │  (HS256 claims)  │
//!                └────────┬─────────┘ └──────────────────┘
//!                         │
//!                ┌────────▼─────────┐
//!                │   UserLookup     │
//!                │   (user store)   │
//!                └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use gatekeeper_auth::{AuthStrategy, BearerStrategy, Principal};
//! use gatekeeper_core::UserId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let strategy = BearerStrategy::new("shared-secret", chrono::Duration::minutes(30));
//! let principal = Principal {
//!     id: UserId::generate(),
//!     login: "alice".to_string(),
//!     scopes: vec!["orders.read".to_string()],
//! };
//!
//! let token = strategy.generate_token(&principal)?;
//! let authenticated = strategy.authenticate_token(&format!("Bearer {token}")).await?;
//! strategy.authorize(&authenticated, &["orders.read".to_string()])?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod basic;
pub mod bearer;
pub mod error;
pub mod principal;
pub mod strategy;

pub use basic::{decode_basic, BasicStrategy};
pub use bearer::{BearerStrategy, DEFAULT_TOKEN_TTL_MINUTES};
pub use error::{AuthError, Result};
pub use principal::{Credentials, Principal, UserLookup};
pub use strategy::{authorize_scopes, AuthStrategy, AuthType};

#[cfg(any(test, feature = "test-utils"))]
pub use strategy::MockAuthStrategy;
