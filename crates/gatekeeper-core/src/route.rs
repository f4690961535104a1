//! Route model: one externally exposed endpoint mapped to one backend endpoint.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Path namespace reserved for the gateway's own management routes.
pub const RESERVED_NAMESPACE: &str = "/api-gatekeeper";

/// HTTP methods a route may declare.
pub const SUPPORTED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

static VARIABLE_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\{(.*?)\}").expect("Invalid route variable regex"));

/// One externally exposed endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// HTTP verb, upper-cased by [`Route::normalize`].
    #[serde(default)]
    pub method: String,
    /// Path template sent to the backend; may contain `{var}` placeholders.
    #[serde(default)]
    pub backend_path: String,
    /// Path template exposed to callers; defaults to `backend_path`.
    #[serde(default)]
    pub gatekeeper_path: String,
    /// Upstream call budget in seconds.
    #[serde(default)]
    pub timeout_seconds: u64,
    /// Skip authentication and authorization entirely.
    #[serde(default)]
    pub is_public: bool,
    /// Forward caller headers to the backend.
    #[serde(default)]
    pub pass_headers: bool,
    /// Scopes required in addition to the backend's.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Static headers applied over the backend's static headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Route {
    /// Check required fields and permitted values.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let method = self.method.trim();
        if method.is_empty() {
            return Err(ConfigError::MissingField("route.method"));
        }
        if !SUPPORTED_METHODS.contains(&method.to_ascii_uppercase().as_str()) {
            return Err(ConfigError::NotOneOf {
                field: "route.method",
                allowed: SUPPORTED_METHODS.join(", "),
            });
        }
        if self.backend_path.trim().is_empty() {
            return Err(ConfigError::MissingField("route.backendPath"));
        }

        let exposed = self.effective_gatekeeper_path();
        if is_reserved(exposed) {
            return Err(ConfigError::ReservedNamespace(exposed.to_string()));
        }
        if !exposed.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "route.gatekeeperPath",
                reason: format!("must start with '/' (got '{exposed}')"),
            });
        }
        validate_segments(exposed)?;
        validate_headers("route.headers", &self.headers)?;
        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "route.timeoutSeconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Upper-case the method, trim paths, and default the gatekeeper path.
    pub fn normalize(&mut self) {
        self.method = self.method.trim().to_ascii_uppercase();
        self.backend_path = self.backend_path.trim().to_string();
        self.gatekeeper_path = self.effective_gatekeeper_path().to_string();
        self.scopes.retain(|s| !s.trim().is_empty());
    }

    /// Validate, then normalize.
    ///
    /// # Errors
    ///
    /// Returns the first validation error.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        self.validate()?;
        self.normalize();
        Ok(())
    }

    /// Registry dedup key: `"<METHOD> <gatekeeperPath>"`.
    #[must_use]
    pub fn pattern(&self) -> String {
        format!("{} {}", self.method, self.gatekeeper_path)
    }

    /// Short log-friendly name, e.g. `get-v2-orders-{id}`.
    #[must_use]
    pub fn name(&self) -> String {
        let raw = format!("{}-{}", self.method, self.gatekeeper_path.replace('/', "-"));
        let mut name = String::with_capacity(raw.len());
        for c in raw.to_lowercase().chars() {
            if c == '-' && name.ends_with('-') {
                continue;
            }
            name.push(c);
        }
        name.trim_end_matches('-').to_string()
    }

    /// Route name prefixed with its backend, e.g. `orders-api.get-v2-orders-{id}`.
    #[must_use]
    pub fn qualified_name(&self, backend: &str) -> String {
        format!("{}.{}", backend.to_lowercase(), self.name())
    }

    /// Variables declared in the gatekeeper path, in order of first appearance.
    #[must_use]
    pub fn pattern_variables(&self) -> Vec<RouteVariable> {
        let mut vars: Vec<RouteVariable> = Vec::new();
        for m in VARIABLE_PATTERN.find_iter(&self.gatekeeper_path) {
            let token = m.as_str();
            if !vars.iter().any(|v| v.token == token) {
                vars.push(RouteVariable {
                    token: token.to_string(),
                });
            }
        }
        vars
    }

    fn effective_gatekeeper_path(&self) -> &str {
        let exposed = self.gatekeeper_path.trim();
        if exposed.is_empty() {
            let backend = self.backend_path.trim();
            backend.split_once('?').map_or(backend, |(path, _)| path)
        } else {
            exposed
        }
    }
}

/// Path variables must fill a whole segment, written `{name}` or, in the
/// last segment only, `{*name}`.
fn validate_segments(path: &str) -> Result<()> {
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    for (i, segment) in segments.iter().enumerate() {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            field: "route.gatekeeperPath",
            reason: format!("{reason} (got '{path}')"),
        };
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err(invalid("path variables must be written as {name}"));
        }
        let has_brace = segment.contains('{') || segment.contains('}');
        if !has_brace {
            continue;
        }
        let inner = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .filter(|s| !s.is_empty() && !s.contains(['{', '}']))
            .ok_or_else(|| invalid("a path variable must fill a whole segment"))?;
        if let Some(name) = inner.strip_prefix('*') {
            if name.is_empty() || i + 1 != segments.len() {
                return Err(invalid("a catch-all variable must be named and last"));
            }
        }
    }
    Ok(())
}

/// Header names and values must be valid HTTP tokens.
pub(crate) fn validate_headers(
    field: &'static str,
    headers: &BTreeMap<String, String>,
) -> Result<()> {
    for (name, value) in headers {
        if http::HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(ConfigError::InvalidValue {
                field,
                reason: format!("'{name}' is not a valid header name"),
            });
        }
        if http::HeaderValue::from_str(value).is_err() {
            return Err(ConfigError::InvalidValue {
                field,
                reason: format!("value of '{name}' is not a valid header value"),
            });
        }
    }
    Ok(())
}

fn is_reserved(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower == RESERVED_NAMESPACE || lower.starts_with(&format!("{RESERVED_NAMESPACE}/"))
}

/// A `{name}` placeholder declared in a route path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteVariable {
    token: String,
}

impl RouteVariable {
    /// Variable name without braces (and without the `*` of a catch-all).
    #[must_use]
    pub fn name(&self) -> &str {
        let inner = self
            .token
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(&self.token);
        inner.strip_prefix('*').unwrap_or(inner)
    }

    /// The literal `{name}` token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Substitute every occurrence of this variable's token in `template`.
    ///
    /// Returns the template unchanged when `value` is empty or the token does
    /// not occur.
    #[must_use]
    pub fn replace_from_pattern(&self, template: &str, value: &str) -> String {
        if value.trim().is_empty() || !template.contains(&self.token) {
            return template.to_string();
        }
        template.replace(&self.token, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: &str, backend_path: &str) -> Route {
        Route {
            method: method.to_string(),
            backend_path: backend_path.to_string(),
            timeout_seconds: 5,
            ..Route::default()
        }
    }

    #[test]
    fn normalize_uppercases_and_defaults_path() {
        let mut r = route(" get ", "/v2/orders/{id}");
        r.validate_and_normalize().unwrap();
        assert_eq!(r.method, "GET");
        assert_eq!(r.gatekeeper_path, "/v2/orders/{id}");
        assert_eq!(r.pattern(), "GET /v2/orders/{id}");
    }

    #[test]
    fn explicit_gatekeeper_path_is_kept() {
        let mut r = route("get", "/v2/orders/{id}");
        r.gatekeeper_path = "/orders/{id}".to_string();
        r.validate_and_normalize().unwrap();
        assert_eq!(r.pattern(), "GET /orders/{id}");
    }

    #[test]
    fn missing_method_is_rejected() {
        let err = route("  ", "/x").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "config 'route.method' must be present and not be empty"
        );
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = route("FETCH", "/x").validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotOneOf {
                field: "route.method",
                ..
            }
        ));
    }

    #[test]
    fn missing_backend_path_is_rejected() {
        let err = route("GET", "").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "config 'route.backendPath' must be present and not be empty"
        );
    }

    #[test]
    fn reserved_namespace_is_rejected_case_insensitively() {
        let mut r = route("GET", "/users");
        r.gatekeeper_path = "/API-Gatekeeper/v1/users".to_string();
        assert!(matches!(
            r.validate(),
            Err(ConfigError::ReservedNamespace(_))
        ));

        // Inherited from the backend path as well.
        let r = route("GET", "/api-gatekeeper/health");
        assert!(matches!(
            r.validate(),
            Err(ConfigError::ReservedNamespace(_))
        ));
    }

    #[test]
    fn similar_prefix_is_not_reserved() {
        let r = route("GET", "/api-gatekeeperish");
        assert!(r.validate().is_ok());
    }

    #[test]
    fn colon_and_partial_variables_are_rejected() {
        for path in ["/orders/:id", "/orders/id-{id}", "/files/{*rest}/x", "/a/{}"] {
            let mut r = route("GET", path);
            r.gatekeeper_path = path.to_string();
            assert!(
                matches!(
                    r.validate(),
                    Err(ConfigError::InvalidValue {
                        field: "route.gatekeeperPath",
                        ..
                    })
                ),
                "{path}"
            );
        }
    }

    #[test]
    fn invalid_header_is_rejected() {
        let mut r = route("GET", "/x");
        r.headers.insert("Bad Header".to_string(), "v".to_string());
        assert!(matches!(
            r.validate(),
            Err(ConfigError::InvalidValue {
                field: "route.headers",
                ..
            })
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut r = route("GET", "/x");
        r.timeout_seconds = 0;
        assert!(matches!(
            r.validate(),
            Err(ConfigError::InvalidValue {
                field: "route.timeoutSeconds",
                ..
            })
        ));
    }

    #[test]
    fn name_collapses_separators() {
        let mut r = route("GET", "/v2/orders/{id}/");
        r.normalize();
        assert_eq!(r.name(), "get-v2-orders-{id}");
        assert_eq!(r.qualified_name("Orders-API"), "orders-api.get-v2-orders-{id}");
    }

    #[test]
    fn pattern_variables_in_order_without_duplicates() {
        let mut r = route("GET", "/a/{tenant}/b/{id}/c/{tenant}");
        r.normalize();
        let names: Vec<_> = r
            .pattern_variables()
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(names, vec!["tenant", "id"]);
    }

    #[test]
    fn gatekeeper_path_defaults_without_backend_query() {
        let mut r = route("GET", "/v2/search?source=gateway");
        r.normalize();
        assert_eq!(r.gatekeeper_path, "/v2/search");
        assert_eq!(r.backend_path, "/v2/search?source=gateway");
    }

    #[test]
    fn catch_all_variable_name() {
        let mut r = route("GET", "/files/{*rest}");
        r.normalize();
        let vars = r.pattern_variables();
        assert_eq!(vars[0].name(), "rest");
        assert_eq!(vars[0].token(), "{*rest}");
    }

    #[test]
    fn replace_substitutes_every_occurrence() {
        let mut r = route("GET", "/{id}");
        r.normalize();
        let var = &r.pattern_variables()[0];
        assert_eq!(var.token(), "{id}");
        assert_eq!(
            var.replace_from_pattern("/v2/{id}/copy/{id}", "42"),
            "/v2/42/copy/42"
        );
    }

    #[test]
    fn replace_skips_empty_value_and_absent_token() {
        let mut r = route("GET", "/{id}");
        r.normalize();
        let var = &r.pattern_variables()[0];
        assert_eq!(var.replace_from_pattern("/v2/{id}", ""), "/v2/{id}");
        assert_eq!(var.replace_from_pattern("/v2/static", "42"), "/v2/static");
    }

    #[test]
    fn replace_is_idempotent() {
        let mut r = route("GET", "/{id}");
        r.normalize();
        let var = &r.pattern_variables()[0];
        let once = var.replace_from_pattern("/v2/orders/{id}", "42");
        let twice = var.replace_from_pattern(&once, "42");
        assert_eq!(once, twice);
    }
}
