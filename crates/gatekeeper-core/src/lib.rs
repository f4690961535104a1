//! Core types for api-gatekeeper.
//!
//! This crate provides the foundational types used throughout the gateway:
//!
//! - **Identifiers**: `UserId` for gateway-managed users, `RequestId` for correlation
//! - **Backend/Route model**: configuration values with validation and normalization
//! - **Error types**: `ConfigError`, fatal at startup
//!
//! # Example
//!
//! ```
//! use gatekeeper_core::{Backend, Route};
//!
//! let mut backend = Backend {
//!     name: "orders-api".to_string(),
//!     host: "http://orders.internal".to_string(),
//!     routes: vec![Route {
//!         method: "get".to_string(),
//!         backend_path: "/v2/orders/{id}".to_string(),
//!         gatekeeper_path: "/orders/{id}".to_string(),
//!         timeout_seconds: 2,
//!         ..Route::default()
//!     }],
//!     ..Backend::default()
//! };
//! backend.validate_and_normalize().unwrap();
//!
//! let route = &backend.routes[0];
//! assert_eq!(route.pattern(), "GET /orders/{id}");
//!
//! let id = &route.pattern_variables()[0];
//! assert_eq!(id.replace_from_pattern(&route.backend_path, "42"), "/v2/orders/42");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backend;
pub mod error;
pub mod ids;
pub mod route;

pub use backend::Backend;
pub use error::{ConfigError, Result};
pub use ids::{IdError, RequestId, UserId, GATEKEEPER_REQUEST_ID_HEADER, REQUEST_ID_HEADER};
pub use route::{Route, RouteVariable, RESERVED_NAMESPACE};
