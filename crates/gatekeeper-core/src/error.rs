//! Configuration error types for api-gatekeeper.
//!
//! Every variant is fatal at startup: an invalid backend or route aborts the
//! process before the listener is bound.

use thiserror::Error;

/// A result type using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading, validating, or normalizing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is blank or absent.
    #[error("config '{0}' must be present and not be empty")]
    MissingField(&'static str),

    /// A field holds a value outside its permitted set.
    #[error("config '{field}' must be one of [{allowed}]")]
    NotOneOf {
        /// Dotted config key.
        field: &'static str,
        /// Comma-separated permitted values.
        allowed: String,
    },

    /// A field holds a value that is otherwise invalid.
    #[error("config '{field}' {reason}")]
    InvalidValue {
        /// Dotted config key.
        field: &'static str,
        /// What is wrong with the value.
        reason: String,
    },

    /// A route tried to claim the gateway's own management namespace.
    #[error(
        "config 'route.gatekeeperPath' should not start with /api-gatekeeper, \
         this is a reserved route namespace (got '{0}')"
    )]
    ReservedNamespace(String),

    /// Two backends share a name.
    #[error("config 'backend.name' must be unique, '{0}' is declared more than once")]
    DuplicateBackend(String),

    /// An error inside a specific backend or route, with its location.
    #[error("{context}: {source}")]
    Context {
        /// Backend name and, when known, the route pattern.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<ConfigError>,
    },

    /// The config file does not have a YAML extension.
    #[error("config file '{0}' must have a .yml or .yaml extension")]
    UnsupportedExtension(String),

    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path of the config file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Wrap this error with location context.
    #[must_use]
    pub fn within(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}
