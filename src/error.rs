//! Gateway error taxonomy.
//!
//! Every failure inside the proxy is converted to a JSON body of the form
//! `{ "error": "..." }` at the handler boundary. Upstream failures are logged
//! with full detail server-side but reported to the caller only through the
//! mount's generic failure message.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Message used for upstream failures when no mount-specific one applies.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Proxy request failed";

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("no usable path segments in request")]
    InvalidPath,

    #[error("required request parameters are missing")]
    MissingParameters,

    #[error("no mount serves this path")]
    NotFound,

    #[error("method not allowed for the resolved route")]
    MethodNotAllowed,

    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream did not answer within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("invalid upstream url: {0}")]
    InvalidUpstreamUrl(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidPath | ProxyError::MissingParameters => StatusCode::BAD_REQUEST,
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::UpstreamUnreachable(_)
            | ProxyError::UpstreamTimeout(_)
            | ProxyError::InvalidUpstreamUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures that happened while talking to the upstream.
    pub fn is_upstream(&self) -> bool {
        self.status() == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidPath => "invalid_path",
            ProxyError::MissingParameters => "missing_parameters",
            ProxyError::NotFound => "not_found",
            ProxyError::MethodNotAllowed => "method_not_allowed",
            ProxyError::PayloadTooLarge => "payload_too_large",
            ProxyError::UpstreamUnreachable(_) => "unreachable",
            ProxyError::UpstreamTimeout(_) => "timeout",
            ProxyError::InvalidUpstreamUrl(_) => "invalid_url",
        }
    }

    /// Build the caller-facing response. Upstream failures only ever expose
    /// `failure_message`.
    pub fn to_response(&self, failure_message: &str) -> Response {
        let message = match self {
            ProxyError::InvalidPath => "Invalid path",
            ProxyError::MissingParameters => "Missing parameters",
            ProxyError::NotFound => "Not found",
            ProxyError::MethodNotAllowed => "Method not allowed",
            ProxyError::PayloadTooLarge => "Payload too large",
            ProxyError::UpstreamUnreachable(_)
            | ProxyError::UpstreamTimeout(_)
            | ProxyError::InvalidUpstreamUrl(_) => failure_message,
        };

        (self.status(), Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        self.to_response(DEFAULT_FAILURE_MESSAGE)
    }
}
