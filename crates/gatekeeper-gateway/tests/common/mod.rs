//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use gatekeeper_auth::{AuthStrategy, BasicStrategy, BearerStrategy, MockAuthStrategy};
use gatekeeper_core::{Backend, Route};
use gatekeeper_gateway::{
    create_router, ApiConfig, BackendDispatcher, DispatchConfig, GatewayState,
};
use gatekeeper_store::RocksStore;
use gatekeeper_users::{UserService, UsersConfig};

/// A router wired to a mock auth strategy and a throwaway user store.
pub struct TestGateway {
    pub router: Router,
    pub auth: Arc<MockAuthStrategy>,
    pub users: Arc<UserService<RocksStore>>,
    _dir: TempDir,
}

/// Optional collaborators.
#[derive(Default)]
pub struct Options {
    /// Authenticate with the Basic strategy over the user store instead of the mock.
    pub basic_auth: bool,
    /// Enable bearer token issuance on login.
    pub issuer: Option<Arc<BearerStrategy>>,
    /// Browser origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
}

pub fn gateway(backends: Vec<Backend>) -> TestGateway {
    gateway_with(backends, Options::default())
}

pub fn gateway_with(mut backends: Vec<Backend>, options: Options) -> TestGateway {
    for backend in &mut backends {
        backend.validate_and_normalize().unwrap();
    }

    let dir = TempDir::new().unwrap();
    let store = Arc::new(RocksStore::open(dir.path()).unwrap());
    let users = Arc::new(UserService::new(store, UsersConfig { bcrypt_cost: 4 }));
    let mock = Arc::new(MockAuthStrategy::default());

    let auth: Arc<dyn AuthStrategy> = if options.basic_auth {
        Arc::new(BasicStrategy::new(Arc::clone(&users))) as Arc<dyn AuthStrategy>
    } else {
        Arc::clone(&mock) as Arc<dyn AuthStrategy>
    };
    let dispatcher = BackendDispatcher::new(&DispatchConfig::default()).unwrap();

    let mut state = GatewayState::new(
        auth,
        Arc::clone(&users),
        dispatcher,
        ApiConfig {
            cors_origins: options.cors_origins,
            ..ApiConfig::default()
        },
    );
    if let Some(issuer) = options.issuer {
        state = state.with_token_issuer(issuer);
    }

    TestGateway {
        router: create_router(Arc::new(state), &backends),
        auth: mock,
        users,
        _dir: dir,
    }
}

/// A backend pointing at `host` with the given routes.
pub fn backend(name: &str, host: &str, routes: Vec<Route>) -> Backend {
    Backend {
        name: name.to_string(),
        host: host.to_string(),
        routes,
        ..Backend::default()
    }
}

/// A route with a 5 second budget.
pub fn route(method: &str, backend_path: &str, gatekeeper_path: &str) -> Route {
    Route {
        method: method.to_string(),
        backend_path: backend_path.to_string(),
        gatekeeper_path: gatekeeper_path.to_string(),
        timeout_seconds: 5,
        ..Route::default()
    }
}

/// A mock bearer token carrying `scopes`.
pub fn token(scopes: &[&str]) -> String {
    format!("Bearer test-token:tester:{}", scopes.join(","))
}

/// Drive one request through the router and collect the response.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

/// Parse a JSON response body.
pub fn json(body: &Bytes) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}
