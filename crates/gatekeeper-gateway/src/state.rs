//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use gatekeeper_auth::{AuthStrategy, BearerStrategy};
use gatekeeper_users::UserManagement;

use crate::config::ApiConfig;
use crate::dispatch::BackendDispatcher;

/// Shared application state for the gateway.
///
/// Collaborators are trait objects: the auth strategy is chosen at startup
/// from configuration, and tests substitute mocks for both seams.
#[derive(Clone)]
pub struct GatewayState {
    /// The strategy that authenticates and authorizes every protected route.
    pub auth: Arc<dyn AuthStrategy>,
    /// Gateway-managed users.
    pub users: Arc<dyn UserManagement>,
    /// Upstream client used for backend routes.
    pub dispatcher: BackendDispatcher,
    /// Issues bearer tokens on login. `None` when no JWT secret is configured.
    pub token_issuer: Option<Arc<BearerStrategy>>,
    /// The `api` configuration section.
    pub config: ApiConfig,
}

impl GatewayState {
    /// Create a new gateway state.
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthStrategy>,
        users: Arc<dyn UserManagement>,
        dispatcher: BackendDispatcher,
        config: ApiConfig,
    ) -> Self {
        Self {
            auth,
            users,
            dispatcher,
            token_issuer: None,
            config,
        }
    }

    /// Enable bearer token issuance on the login route.
    #[must_use]
    pub fn with_token_issuer(mut self, issuer: Arc<BearerStrategy>) -> Self {
        self.token_issuer = Some(issuer);
        self
    }
}
