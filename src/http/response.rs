//! Response relay.
//!
//! # Responsibilities
//! - Pass the upstream status code through unchanged
//! - Re-emit JSON bodies as JSON, everything else as raw text
//! - Apply the mount's empty-body policy
//!
//! # Design Decisions
//! - Upstream business status codes are never interpreted
//! - A body that fails to parse as JSON is the normal fallback path,
//!   not an error
//! - Non-JSON bodies keep the upstream content type (text/plain if absent)

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::config::schema::EmptyBodyPolicy;
use crate::upstream::UpstreamResponse;

const TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");

pub fn relay(upstream: UpstreamResponse, empty_body: EmptyBodyPolicy) -> Response {
    let status = upstream.status;

    if upstream.body.is_empty() && empty_body == EmptyBodyPolicy::Success {
        return (status, Json(serde_json::json!({ "success": true }))).into_response();
    }

    match serde_json::from_slice::<serde_json::Value>(&upstream.body) {
        Ok(value) => (status, Json(value)).into_response(),
        Err(_) => {
            let content_type = upstream.content_type.unwrap_or(TEXT_PLAIN);
            (
                status,
                [(header::CONTENT_TYPE, content_type)],
                Body::from(upstream.body),
            )
                .into_response()
        }
    }
}
