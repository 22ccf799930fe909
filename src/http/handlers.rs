//! Request handlers.
//!
//! # Responsibilities
//! - Run the proxy pipeline for every mounted prefix
//! - Serve the assign-driver convenience endpoint
//! - Log and count every outcome under the request ID
//!
//! # Design Decisions
//! - The upstream future is awaited inline, never spawned; dropping the
//!   handler aborts the outbound call
//! - Inbound bodies are only read for methods that carry one
//! - Errors are converted at this boundary and nowhere else

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{request::Parts, HeaderMap, Method, Request},
    response::Response,
};
use serde::Deserialize;

use crate::config::schema::EmptyBodyPolicy;
use crate::error::ProxyError;
use crate::http::request::{request_id, request_id_str};
use crate::http::response::relay;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::routing::normalize::check_segment;
use crate::routing::PathCapture;
use crate::security::headers::outbound_headers;
use crate::upstream::request::carries_body;
use crate::upstream::{forward_query, ForwardRequest, UpstreamResponse};

pub const ASSIGN_DRIVER_PATH: &str = "/api/admin/assign-driver";
const ASSIGN_DRIVER_FAILURE: &str = "Upstream fetch failed";
const PASSTHROUGH: &str = "passthrough";

/// Longest upstream error body echoed into a log line.
const LOGGED_BODY_LIMIT: usize = 512;

/// Per-request bookkeeping for logs and metrics.
struct Outcome<'a> {
    request_id: String,
    method: Method,
    mount: &'a str,
    route: String,
    start: Instant,
}

impl<'a> Outcome<'a> {
    fn new(headers: &HeaderMap, method: &Method, mount: &'a str, start: Instant) -> Self {
        Self {
            request_id: request_id_str(headers).to_string(),
            method: method.clone(),
            mount,
            route: PASSTHROUGH.to_string(),
            start,
        }
    }

    fn relayed(&self, upstream: UpstreamResponse, empty_body: EmptyBodyPolicy) -> Response {
        let status = upstream.status;
        if !status.is_success() {
            let len = upstream.body.len().min(LOGGED_BODY_LIMIT);
            tracing::warn!(
                request_id = %self.request_id,
                mount = %self.mount,
                route = %self.route,
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&upstream.body[..len]),
                "Upstream returned non-success status"
            );
        }

        metrics::record_request(self.method.as_str(), status.as_u16(), self.mount, &self.route, self.start);
        relay(upstream, empty_body)
    }

    fn failed(&self, err: ProxyError, failure_message: &str) -> Response {
        if err.is_upstream() {
            tracing::error!(
                request_id = %self.request_id,
                mount = %self.mount,
                route = %self.route,
                kind = err.kind(),
                error = %err,
                "Upstream call failed"
            );
            metrics::record_upstream_failure(self.mount, err.kind());
        } else {
            tracing::debug!(
                request_id = %self.request_id,
                mount = %self.mount,
                route = %self.route,
                error = %err,
                "Request rejected"
            );
        }

        metrics::record_request(
            self.method.as_str(),
            err.status().as_u16(),
            self.mount,
            &self.route,
            self.start,
        );
        err.to_response(failure_message)
    }
}

/// Main proxy handler for every mounted prefix.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    tracing::debug!(
        request_id = %request_id_str(&parts.headers),
        method = %parts.method,
        path = %path,
        "Proxying request"
    );

    let Some(mount) = state.router.resolve(path) else {
        let outcome = Outcome::new(&parts.headers, &parts.method, "none", start);
        return outcome.failed(ProxyError::NotFound, "");
    };

    let mut outcome = Outcome::new(&parts.headers, &parts.method, &mount.name, start);

    let rewrite = match PathCapture::from_uri(&parts.uri, state.router.capture_key())
        .normalize(&mount.prefix)
        .and_then(|segments| mount.table.rewrite(&segments, &parts.method))
    {
        Ok(rewrite) => rewrite,
        Err(err) => return outcome.failed(err, &mount.failure_message),
    };
    if let Some(route) = &rewrite.route {
        outcome.route = route.clone();
    }

    let query = forward_query(
        parts.uri.query(),
        state.router.capture_key(),
        &rewrite.default_query,
    );

    let body = match read_body(&state, &parts.method, body).await {
        Ok(body) => body,
        Err(err) => return outcome.failed(err, &mount.failure_message),
    };

    match send(&state, &parts, parts.method.clone(), rewrite.path, query, body).await {
        Ok(upstream) => outcome.relayed(upstream, mount.empty_body),
        Err(err) => outcome.failed(err, &mount.failure_message),
    }
}

#[derive(Debug, Default, Deserialize)]
struct AssignDriverBody {
    #[serde(rename = "rideId")]
    ride_id: Option<serde_json::Value>,
    payload: Option<serde_json::Value>,
}

/// Ride ID as a path segment. Empty, zero, or non-scalar IDs count as missing.
fn ride_segment(value: &serde_json::Value) -> Result<String, ProxyError> {
    let id = match value {
        serde_json::Value::String(s) if !s.is_empty() => s.clone(),
        serde_json::Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => return Err(ProxyError::MissingParameters),
    };

    if id.contains('/') {
        return Err(ProxyError::InvalidPath);
    }
    check_segment(&id)?;
    Ok(id)
}

/// A payload must be present and truthy: `false`, `0`, `""` and null count as missing.
fn has_payload(payload: &serde_json::Value) -> bool {
    match payload {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// `POST /api/admin/assign-driver` with `{ rideId, payload }`.
pub async fn assign_driver(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let mut outcome = Outcome::new(&parts.headers, &parts.method, "assign-driver", start);
    outcome.route = "rides/:id/assign".to_string();

    if parts.method != Method::POST {
        return outcome.failed(ProxyError::MethodNotAllowed, ASSIGN_DRIVER_FAILURE);
    }

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => return outcome.failed(ProxyError::PayloadTooLarge, ASSIGN_DRIVER_FAILURE),
    };
    let parsed: AssignDriverBody = serde_json::from_slice(&bytes).unwrap_or_default();

    let (ride_id, payload) = match (parsed.ride_id, parsed.payload) {
        (Some(ride_id), Some(payload)) if has_payload(&payload) => (ride_id, payload),
        _ => return outcome.failed(ProxyError::MissingParameters, ASSIGN_DRIVER_FAILURE),
    };
    let ride = match ride_segment(&ride_id) {
        Ok(ride) => ride,
        Err(err) => return outcome.failed(err, ASSIGN_DRIVER_FAILURE),
    };

    let body = Bytes::from(payload.to_string());
    let path = format!("/admin/rides/{}/assign", ride);

    match send(&state, &parts, Method::POST, path, Vec::new(), Some(body)).await {
        Ok(upstream) => outcome.relayed(upstream, EmptyBodyPolicy::Passthrough),
        Err(err) => outcome.failed(err, ASSIGN_DRIVER_FAILURE),
    }
}

async fn read_body(state: &AppState, method: &Method, body: Body) -> Result<Option<Bytes>, ProxyError> {
    if !carries_body(method) {
        return Ok(None);
    }

    axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map(Some)
        .map_err(|_| ProxyError::PayloadTooLarge)
}

/// Inject identity and forward one request under the upstream deadline.
async fn send(
    state: &AppState,
    inbound: &Parts,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Bytes>,
) -> Result<UpstreamResponse, ProxyError> {
    let identity = state.identity.resolve(&inbound.headers);
    let headers = outbound_headers(&identity, request_id(&inbound.headers));

    tracing::debug!(
        request_id = %request_id_str(&inbound.headers),
        upstream_path = %path,
        admin_id = %identity.id,
        admin_role = %identity.role,
        "Forwarding upstream"
    );

    let request = ForwardRequest::new(method, path, query, body, headers);
    with_deadline(state.upstream_timeout, state.upstream.forward(request)).await
}
