//! Outbound header construction.
//!
//! # Responsibilities
//! - Build the complete header set sent to the upstream
//! - Attach the resolved admin identity
//! - Propagate the request ID
//!
//! # Design Decisions
//! - Headers are built fresh; nothing from the inbound request is copied,
//!   so callers cannot smuggle identity or hop-by-hop headers upstream
//! - Identity headers are always present, empty when unknown

use axum::http::{header, HeaderMap, HeaderValue};

use crate::http::request::X_REQUEST_ID;
use crate::security::identity::{AdminIdentity, X_ADMIN_ID, X_ADMIN_ROLE};

const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

pub fn outbound_headers(identity: &AdminIdentity, request_id: Option<&HeaderValue>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, APPLICATION_JSON);
    headers.insert(header::ACCEPT, APPLICATION_JSON);
    headers.insert(X_ADMIN_ID, header_value(&identity.id));
    headers.insert(X_ADMIN_ROLE, header_value(&identity.role));

    if let Some(id) = request_id {
        headers.insert(X_REQUEST_ID, id.clone());
    }

    headers
}

/// Identity values are validated at startup (fixed) or came from a header
/// (forwarded); anything still unrepresentable is sent empty.
fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static(""))
}
