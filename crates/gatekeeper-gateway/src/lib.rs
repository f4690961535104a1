//! HTTP gateway for api-gatekeeper.
//!
//! This crate exposes configured backend routes to callers. For every request
//! it:
//!
//! - resolves the route and rejects unbound methods with 405
//! - authenticates the caller with the configured strategy (Basic or Bearer)
//! - checks the backend and route scopes
//! - forwards to the backend, streaming both bodies, or serves the request
//!   in-process for the gateway's own `/api-gatekeeper` routes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Callers                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    gatekeeper-gateway                       │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │   Route     │ │   Guard     │ │    Backend          │    │
//! │  │  Registry   │ │ (auth+scope)│ │    Dispatcher       │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!        ┌──────────┐   ┌──────────┐   ┌──────────┐
//!        │ Backends │   │  Users   │   │  Auth    │
//!        │  (HTTP)  │   │ (RocksDB)│   │ strategy │
//!        └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use gatekeeper_auth::BasicStrategy;
//! use gatekeeper_gateway::{create_router, BackendDispatcher, GatekeeperConfig, GatewayState};
//! use gatekeeper_store::RocksStore;
//! use gatekeeper_users::UserService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatekeeperConfig::load(Path::new("gatekeeper.yml"))?;
//!
//! let store = Arc::new(RocksStore::open(&config.database.path)?);
//! let users = Arc::new(UserService::new(store, config.users.clone()));
//! let auth = Arc::new(BasicStrategy::new(Arc::clone(&users)));
//! let dispatcher = BackendDispatcher::new(&config.dispatch)?;
//!
//! let state = GatewayState::new(auth, users, dispatcher, config.api.clone());
//! let app = create_router(Arc::new(state), &config.backends);
//!
//! let listener = tokio::net::TcpListener::bind(&config.api.address).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod management;
pub mod registry;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, DatabaseConfig, DispatchConfig, GatekeeperConfig};
pub use context::{RequestContext, GATEKEEPER_USER_HEADER};
pub use dispatch::BackendDispatcher;
pub use error::ApiError;
pub use registry::{application, ApplicationHandler, RouteBinding, RouteRegistry, RouteTarget};
pub use routes::create_router;
pub use state::GatewayState;
