//! Gateway configuration types.
//!
//! The configuration is a single YAML document. `${VAR}` references are
//! replaced with environment values before parsing, then every section is
//! validated and normalized so the rest of the gateway can trust it.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use gatekeeper_auth::AuthType;
use gatekeeper_core::{Backend, ConfigError};
use gatekeeper_users::UsersConfig;

static ENV_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid env reference regex"));

/// Database providers the gateway can open.
pub const SUPPORTED_PROVIDERS: &[&str] = &["rocksdb"];

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatekeeperConfig {
    /// Listener and authentication settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// User database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// User service settings.
    #[serde(default)]
    pub users: UsersConfig,
    /// Upstream client settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Upstream services and their routes.
    #[serde(default)]
    pub backends: Vec<Backend>,
}

/// The `api` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default)]
    pub address: String,

    /// Authentication strategy: `basic` or `jwt`.
    #[serde(default)]
    pub auth_type: String,

    /// HMAC secret for bearer tokens. Required when `authType` is `jwt`.
    #[serde(default)]
    pub jwt_secret: String,

    /// Lifetime of issued bearer tokens.
    #[serde(
        default = "ApiConfig::default_token_expiration",
        with = "humantime_serde"
    )]
    pub token_expiration: Duration,

    /// Application user created at startup, if absent.
    #[serde(default)]
    pub user: Option<ApplicationUser>,

    /// Allowed CORS origins. CORS handling is off when empty.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "ApiConfig::default_max_body")]
    pub max_body_bytes: usize,
}

impl ApiConfig {
    const fn default_token_expiration() -> Duration {
        Duration::from_secs(30 * 60)
    }

    const fn default_max_body() -> usize {
        10 * 1024 * 1024 // 10 MB
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            auth_type: String::new(),
            jwt_secret: String::new(),
            token_expiration: Self::default_token_expiration(),
            user: None,
            cors_origins: Vec::new(),
            max_body_bytes: Self::default_max_body(),
        }
    }
}

/// Credentials of the bootstrap application user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationUser {
    /// Login name.
    #[serde(default)]
    pub login: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
}

/// The `database` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Storage provider.
    #[serde(default = "DatabaseConfig::default_provider")]
    pub provider: String,
    /// Data directory.
    #[serde(default)]
    pub path: String,
}

impl DatabaseConfig {
    fn default_provider() -> String {
        "rocksdb".to_string()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            provider: Self::default_provider(),
            path: String::new(),
        }
    }
}

/// Upstream HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    /// How long an idle pooled connection is kept.
    #[serde(
        default = "DispatchConfig::default_pool_idle_timeout",
        with = "humantime_serde"
    )]
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections kept per backend host.
    #[serde(default = "DispatchConfig::default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// Budget for establishing a new upstream connection.
    #[serde(
        default = "DispatchConfig::default_connect_timeout",
        with = "humantime_serde"
    )]
    pub connect_timeout: Duration,
}

impl DispatchConfig {
    const fn default_pool_idle_timeout() -> Duration {
        Duration::from_secs(90)
    }

    const fn default_pool_max_idle_per_host() -> usize {
        32
    }

    const fn default_connect_timeout() -> Duration {
        Duration::from_secs(5)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Self::default_pool_idle_timeout(),
            pool_max_idle_per_host: Self::default_pool_max_idle_per_host(),
            connect_timeout: Self::default_connect_timeout(),
        }
    }
}

impl GatekeeperConfig {
    /// Read, expand, parse, and validate a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file has an unsupported extension,
    /// cannot be read or parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if extension != "yml" && extension != "yaml" {
            return Err(ConfigError::UnsupportedExtension(path.display().to_string()));
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Expand, parse, and validate a YAML document.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when parsing or validation fails.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let expanded = substitute_env(raw, |name| std::env::var(name).ok());
        let mut config: Self =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate_and_normalize()?;
        Ok(config)
    }

    /// Validate every section and normalize backends and routes in place.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate_and_normalize(&mut self) -> Result<(), ConfigError> {
        self.api.address = self.api.address.trim().to_string();
        if self.api.address.is_empty() {
            return Err(ConfigError::MissingField("api.address"));
        }

        let auth_type = self.auth_type()?;
        if auth_type == AuthType::Jwt && self.api.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingField("api.jwtSecret"));
        }
        if !self.api.jwt_secret.trim().is_empty() && self.api.token_expiration.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "api.tokenExpiration",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(user) = &self.api.user {
            if user.login.trim().is_empty() {
                return Err(ConfigError::MissingField("api.user.login"));
            }
            if user.password.trim().is_empty() {
                return Err(ConfigError::MissingField("api.user.password"));
            }
        }

        let provider = self.database.provider.trim().to_ascii_lowercase();
        if !SUPPORTED_PROVIDERS.contains(&provider.as_str()) {
            return Err(ConfigError::NotOneOf {
                field: "database.provider",
                allowed: SUPPORTED_PROVIDERS.join(", "),
            });
        }
        self.database.provider = provider;
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField("database.path"));
        }

        if self.backends.is_empty() {
            return Err(ConfigError::MissingField("backends"));
        }
        let mut names = HashSet::new();
        for backend in &mut self.backends {
            backend.validate_and_normalize()?;
            if !names.insert(backend.name.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateBackend(backend.name.clone()));
            }
        }
        Ok(())
    }

    /// The configured authentication strategy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `api.authType` is blank or unknown.
    pub fn auth_type(&self) -> Result<AuthType, ConfigError> {
        let raw = self.api.auth_type.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingField("api.authType"));
        }
        AuthType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| ConfigError::NotOneOf {
                field: "api.authType",
                allowed: AuthType::ALL.map(AuthType::as_str).join(", "),
            })
    }
}

/// Replace every `${NAME}` in `raw` with `lookup(NAME)`, or an empty string
/// when the variable is not set.
pub fn substitute_env(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    ENV_REFERENCE
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            lookup(caps[1].trim()).unwrap_or_default()
        })
        .into_owned()
}
