//! api-gatekeeper - authenticating API gateway
//!
//! This is the main entry point for the gateway service. It loads the YAML
//! configuration, opens the user store, bootstraps the application user,
//! selects the authentication strategy, and serves until Ctrl-C.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` and set `DEV_MODE=true` to replace the
//! configured strategy with a mock that accepts tokens of the form
//! `test-token:<login>:<scope>,<scope>`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatekeeper_auth::{AuthStrategy, AuthType, BasicStrategy, BearerStrategy};
use gatekeeper_gateway::{create_router, BackendDispatcher, GatekeeperConfig, GatewayState};
use gatekeeper_store::RocksStore;
use gatekeeper_users::UserService;

/// Authenticating API gateway.
#[derive(Debug, Parser)]
#[command(name = "api-gatekeeper", version, about)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "GATEKEEPER_CONFIG", default_value = "config.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gatekeeper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!(config = %args.config.display(), "Starting api-gatekeeper");

    let config = GatekeeperConfig::load(&args.config).inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;
    let auth_type = config.auth_type()?;

    tracing::info!(
        address = %config.api.address,
        auth_type = %auth_type,
        backends = config.backends.len(),
        "Gateway configuration loaded"
    );

    // Initialize RocksDB store
    tracing::info!(path = %config.database.path, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.database.path)?);
    let users = Arc::new(UserService::new(store, config.users.clone()));

    if let Some(user) = &config.api.user {
        users
            .create_application_user(&user.login, &user.password)
            .await?;
    }

    let token_issuer = if config.api.jwt_secret.trim().is_empty() {
        None
    } else {
        let ttl = chrono::Duration::from_std(config.api.token_expiration)?;
        Some(Arc::new(BearerStrategy::new(&config.api.jwt_secret, ttl)))
    };

    let auth: Arc<dyn AuthStrategy> = match (auth_type, &token_issuer) {
        (AuthType::Jwt, Some(issuer)) => Arc::clone(issuer) as Arc<dyn AuthStrategy>,
        (AuthType::Jwt, None) => return Err("api.jwtSecret is required for jwt auth".into()),
        (AuthType::Basic, _) => {
            Arc::new(BasicStrategy::new(Arc::clone(&users))) as Arc<dyn AuthStrategy>
        }
    };

    #[cfg(feature = "dev-mode")]
    let auth: Arc<dyn AuthStrategy> = if std::env::var("DEV_MODE").is_ok_and(|v| v == "true") {
        tracing::warn!("DEV MODE ENABLED - using mock auth strategy");
        tracing::warn!("Use tokens in format: test-token:<login>:<scope>,<scope>");
        Arc::new(gatekeeper_auth::MockAuthStrategy::default())
    } else {
        auth
    };
    tracing::info!(strategy = %auth.kind(), "Auth strategy initialized");

    let dispatcher = BackendDispatcher::new(&config.dispatch)?;

    let mut state = GatewayState::new(auth, users, dispatcher, config.api.clone());
    if let Some(issuer) = token_issuer {
        state = state.with_token_issuer(issuer);
    }

    let app = create_router(Arc::new(state), &config.backends);

    // Start HTTP server
    tracing::info!(address = %config.api.address, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.api.address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("api-gatekeeper stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
