//! Backend dispatch: forwards an admitted request to its upstream service and
//! relays the response.
//!
//! The outbound request is assembled from the route's backend path with
//! captured variables substituted, the caller's query merged over the
//! template's own query, and a layered header set. Request and response
//! bodies are streamed; nothing is buffered in the gateway.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use url::Url;

use gatekeeper_core::{Route, GATEKEEPER_REQUEST_ID_HEADER};

use crate::config::DispatchConfig;
use crate::context::{RequestContext, GATEKEEPER_USER_HEADER};
use crate::error::ApiError;

/// Caller headers never forwarded upstream, even when forwarding is enabled.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

#[derive(Debug, Error)]
enum DispatchError {
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),

    #[error("upstream call failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),

    #[error(transparent)]
    DotSegment(#[from] DotSegmentError),
}

/// A captured path value that would climb out of its segment once the
/// outbound URL is normalized.
#[derive(Debug, Error)]
#[error("path parameter '{variable}' must not be a '.' or '..' segment")]
pub struct DotSegmentError {
    /// Name of the offending variable.
    pub variable: String,
}

impl DispatchError {
    fn is_timeout(&self) -> bool {
        matches!(self, Self::Upstream(e) if e.is_timeout())
    }
}

/// Pooled upstream HTTP client shared by every backend route.
#[derive(Debug, Clone)]
pub struct BackendDispatcher {
    client: reqwest::Client,
}

impl BackendDispatcher {
    /// Build the dispatcher and its connection pool.
    ///
    /// Redirects are relayed to the caller rather than followed.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &DispatchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Forward `request` to the backend in `ctx` and relay its response.
    ///
    /// Any failure to reach the backend, including the route timeout, is
    /// logged and answered with a generic 500.
    pub async fn forward(&self, ctx: &RequestContext, request: Request<Body>) -> Response {
        match self.call(ctx, request).await {
            Ok(response) => response,
            Err(DispatchError::DotSegment(err)) => {
                tracing::debug!(
                    error = %err,
                    route = %ctx.route.pattern(),
                    request_id = %ctx.request_id,
                    "Rejected path parameter"
                );
                ApiError::BadRequest(err.to_string()).into_response()
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    timed_out = err.is_timeout(),
                    backend = %ctx.backend.name,
                    route = %ctx.route.pattern(),
                    request_id = %ctx.request_id,
                    "Backend call failed"
                );
                ApiError::Internal.into_response()
            }
        }
    }

    async fn call(
        &self,
        ctx: &RequestContext,
        request: Request<Body>,
    ) -> Result<Response, DispatchError> {
        let (parts, body) = request.into_parts();

        let path = backend_path(&ctx.route, &ctx.path_params)?;
        let url = backend_url(&ctx.backend.host, &path, parts.uri.query())?;
        let headers = outbound_headers(&parts.headers, ctx);

        tracing::debug!(
            method = %parts.method,
            url = %url,
            request_id = %ctx.request_id,
            "Dispatching to backend"
        );

        let mut builder = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .timeout(Duration::from_secs(ctx.route.timeout_seconds));
        if body.size_hint().exact() != Some(0) {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = builder.send().await?;
        Ok(relay(upstream)?)
    }
}

/// Relay status, `Content-Type`, and the streamed body of an upstream response.
fn relay(upstream: reqwest::Response) -> Result<Response, axum::http::Error> {
    let mut builder = Response::builder().status(upstream.status());
    if let Some(content_type) = upstream.headers().get(header::CONTENT_TYPE) {
        builder = builder.header(header::CONTENT_TYPE, content_type.clone());
    }
    builder.body(Body::from_stream(upstream.bytes_stream()))
}

/// Substitute captured path variables into the route's backend path.
///
/// Variables without a captured value are left as literal `{name}` tokens.
/// A catch-all `{*name}` may be referenced as `{*name}` or `{name}` in the
/// backend path.
///
/// # Errors
///
/// Returns [`DotSegmentError`] if a value, or any `/`-separated piece of a
/// catch-all value, is `.` or `..`. Percent-encoding cannot help here: URL
/// parsing treats `%2E%2E` as a dot segment too.
pub fn backend_path(
    route: &Route,
    params: &HashMap<String, String>,
) -> Result<String, DotSegmentError> {
    let mut path = route.backend_path.clone();
    for variable in route.pattern_variables() {
        let Some(value) = params.get(variable.name()) else {
            continue;
        };
        let catch_all = variable.token().starts_with("{*");
        let climbs = if catch_all {
            value.split('/').any(is_dot_segment)
        } else {
            is_dot_segment(value)
        };
        if climbs {
            return Err(DotSegmentError {
                variable: variable.name().to_string(),
            });
        }
        let encoded = encode_param(value, catch_all);
        path = variable.replace_from_pattern(&path, &encoded);
        if catch_all && !encoded.is_empty() {
            path = path.replace(&format!("{{{}}}", variable.name()), &encoded);
        }
    }
    Ok(path)
}

fn is_dot_segment(piece: &str) -> bool {
    matches!(piece, "." | "..")
}

/// Escape characters that would change the structure of the outbound URL.
fn encode_param(value: &str, keep_slashes: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '/' if keep_slashes => out.push('/'),
            '/' => out.push_str("%2F"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            '%' => out.push_str("%25"),
            '\\' => out.push_str("%5C"),
            _ => out.push(c),
        }
    }
    out
}

/// Join `host` and `path`, then merge the caller's query over the path's own.
///
/// When a key repeats, the last value wins; keys keep the position of their
/// first appearance.
///
/// # Errors
///
/// Returns an error if the joined URL does not parse.
pub fn backend_url(
    host: &str,
    path: &str,
    caller_query: Option<&str>,
) -> Result<Url, url::ParseError> {
    let host = host.trim_end_matches('/');
    let path = path.trim();
    let joined = if path.starts_with('/') {
        format!("{host}{path}")
    } else {
        format!("{host}/{path}")
    };
    let mut url = Url::parse(&joined)?;

    let Some(query) = caller_query.filter(|q| !q.is_empty()) else {
        return Ok(url);
    };
    let incoming: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .chain(url::form_urlencoded::parse(query.as_bytes()).into_owned())
        .collect();
    let mut merged: Vec<(String, String)> = Vec::with_capacity(incoming.len());
    for (key, value) in incoming {
        match merged.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => merged.push((key, value)),
        }
    }
    url.query_pairs_mut().clear().extend_pairs(&merged);
    Ok(url)
}

/// Build the outbound header set.
///
/// Layers, lowest precedence first: caller headers (only when forwarding is
/// enabled, minus hop-by-hop headers), backend static headers, route static
/// headers, then the gateway's identity and request-id headers.
#[must_use]
pub fn outbound_headers(caller: &HeaderMap, ctx: &RequestContext) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if ctx.backend.forwards_caller_headers(&ctx.route) {
        for (name, value) in caller {
            if !HOP_BY_HOP.contains(&name.as_str()) {
                headers.append(name.clone(), value.clone());
            }
        }
    }

    for (name, value) in ctx.backend.headers.iter().chain(&ctx.route.headers) {
        set_header(&mut headers, name, value);
    }

    let user = ctx
        .principal_id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    set_header(&mut headers, GATEKEEPER_USER_HEADER, &user);
    set_header(
        &mut headers,
        GATEKEEPER_REQUEST_ID_HEADER,
        ctx.request_id.as_str(),
    );
    headers
}

fn set_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => tracing::warn!(header = %name, "Skipping invalid header"),
    }
}
