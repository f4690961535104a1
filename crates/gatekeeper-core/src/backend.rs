//! Backend model: a named upstream service and the routes it exposes.

use crate::error::{ConfigError, Result};
use crate::route::{validate_headers, Route};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A configured upstream service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backend {
    /// Unique name, used for logging and route qualification.
    #[serde(default)]
    pub name: String,
    /// Base URL of the service.
    #[serde(default)]
    pub host: String,
    /// Scopes required on every route of this backend.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Static headers sent on every backend call.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Forward caller headers on every route of this backend.
    #[serde(default)]
    pub pass_headers: bool,
    /// Routes in declaration order.
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl Backend {
    /// Check the backend's own fields. Routes are checked by
    /// [`Backend::validate_and_normalize`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField("backend.name"));
        }
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::MissingField("backend.host"));
        }
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "backend.host",
                reason: format!("must be an absolute http(s) URL (got '{host}')"),
            });
        }
        validate_headers("backend.headers", &self.headers)
    }

    /// Trim the name and host and drop blank scopes.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.host = self.host.trim().to_string();
        self.scopes.retain(|s| !s.trim().is_empty());
    }

    /// Validate and normalize this backend and every route on it, in place.
    ///
    /// # Errors
    ///
    /// Returns the first error, annotated with the backend name and the
    /// offending route.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        self.validate()?;
        self.normalize();

        let name = self.name.clone();
        for (index, route) in self.routes.iter_mut().enumerate() {
            route.validate_and_normalize().map_err(|e| {
                e.within(format!(
                    "backend '{name}' route #{index} ({} {})",
                    route.method, route.backend_path
                ))
            })?;
        }
        Ok(())
    }

    /// Scopes a caller needs for `route`: backend scopes followed by route scopes.
    ///
    /// Duplicates are kept.
    #[must_use]
    pub fn required_scopes(&self, route: &Route) -> Vec<String> {
        self.scopes
            .iter()
            .chain(route.scopes.iter())
            .cloned()
            .collect()
    }

    /// Whether caller headers are forwarded on `route`.
    #[must_use]
    pub const fn forwards_caller_headers(&self, route: &Route) -> bool {
        self.pass_headers || route.pass_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: orders-api
host: http://orders.internal:8080
scopes: [orders.read]
headers:
  X-Env: prod
routes:
  - method: get
    backendPath: /v2/orders/{id}
    gatekeeperPath: /orders/{id}
    timeoutSeconds: 2
    scopes: [billing.read]
  - method: post
    backendPath: /v2/orders
    timeoutSeconds: 5
    isPublic: true
    passHeaders: true
"#;

    #[test]
    fn deserializes_camel_case_yaml() {
        let backend: Backend = serde_yaml::from_str(YAML).unwrap();
        assert_eq!(backend.name, "orders-api");
        assert_eq!(backend.routes.len(), 2);
        assert_eq!(backend.routes[0].gatekeeper_path, "/orders/{id}");
        assert!(backend.routes[1].is_public);
        assert!(backend.routes[1].pass_headers);
        assert!(backend.routes[1].headers.is_empty());
    }

    #[test]
    fn validate_and_normalize_rewrites_routes_in_place() {
        let mut backend: Backend = serde_yaml::from_str(YAML).unwrap();
        backend.validate_and_normalize().unwrap();
        assert_eq!(backend.routes[0].pattern(), "GET /orders/{id}");
        assert_eq!(backend.routes[1].pattern(), "POST /v2/orders");
    }

    #[test]
    fn missing_name_and_host() {
        let backend = Backend::default();
        assert_eq!(
            backend.validate().unwrap_err().to_string(),
            "config 'backend.name' must be present and not be empty"
        );

        let backend = Backend {
            name: "x".to_string(),
            ..Backend::default()
        };
        assert_eq!(
            backend.validate().unwrap_err().to_string(),
            "config 'backend.host' must be present and not be empty"
        );
    }

    #[test]
    fn route_error_names_backend() {
        let mut backend: Backend = serde_yaml::from_str(YAML).unwrap();
        backend.routes[1].method = String::new();
        let err = backend.validate_and_normalize().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("backend 'orders-api' route #1"), "{msg}");
        assert!(msg.ends_with("config 'route.method' must be present and not be empty"));
    }

    #[test]
    fn required_scopes_keep_order_and_duplicates() {
        let mut backend: Backend = serde_yaml::from_str(YAML).unwrap();
        backend.routes[0].scopes.push("orders.read".to_string());
        assert_eq!(
            backend.required_scopes(&backend.routes[0]),
            vec!["orders.read", "billing.read", "orders.read"]
        );
    }

    #[test]
    fn header_forwarding_is_opt_in() {
        let backend: Backend = serde_yaml::from_str(YAML).unwrap();
        assert!(!backend.forwards_caller_headers(&backend.routes[0]));
        assert!(backend.forwards_caller_headers(&backend.routes[1]));
    }
}
