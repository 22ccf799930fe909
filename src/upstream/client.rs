//! Upstream forwarding.
//!
//! # Responsibilities
//! - Issue the HTTP call described by a [`ForwardRequest`]
//! - Collect status, content type, and body of the answer
//!
//! # Design Decisions
//! - One attempt per request; no retries
//! - Non-2xx answers are successes here; only transport failures are errors
//! - The call is awaited by the handler and never spawned, so dropping the
//!   handler future (client disconnect, deadline) aborts the exchange

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use futures_util::future::{BoxFuture, FutureExt};
use url::Url;

use crate::config::schema::UpstreamConfig;
use crate::error::ProxyError;
use crate::routing::normalize::check_segment;
use crate::upstream::request::ForwardRequest;

/// Raw answer from the upstream.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, content_type: Option<HeaderValue>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }
}

/// Seam between the handlers and the network.
pub trait Upstream: Send + Sync {
    fn forward(&self, request: ForwardRequest) -> BoxFuture<'_, Result<UpstreamResponse, ProxyError>>;
}

/// Forwards over HTTP(S) with a shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL for `request`.
    ///
    /// The parsed URL must stay under `{base}/{namespace}/`, where the
    /// namespace is the first segment of the request path.
    pub fn url_for(&self, request: &ForwardRequest) -> Result<Url, ProxyError> {
        let mut segments = request.path().split('/').filter(|s| !s.is_empty());
        let namespace = segments.next().ok_or(ProxyError::InvalidPath)?;
        check_segment(namespace)?;
        for segment in segments {
            check_segment(segment)?;
        }

        let mut url = Url::parse(&format!("{}{}", self.base_url, request.path()))
            .map_err(|e| ProxyError::InvalidUpstreamUrl(e.to_string()))?;
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ProxyError::InvalidPath);
        }

        let base = Url::parse(&self.base_url).map_err(|e| ProxyError::InvalidUpstreamUrl(e.to_string()))?;
        let root = format!("{}/{}", base.path().trim_end_matches('/'), namespace);
        let contained = url.path() == root || url.path().starts_with(&format!("{}/", root));
        if !contained {
            return Err(ProxyError::InvalidPath);
        }

        url.set_query(request.query_string().as_deref());
        Ok(url)
    }
}

impl Upstream for HttpUpstream {
    fn forward(&self, request: ForwardRequest) -> BoxFuture<'_, Result<UpstreamResponse, ProxyError>> {
        async move {
            let url = self.url_for(&request)?;

            let mut builder = self
                .client
                .request(request.method().clone(), url)
                .headers(request.headers().clone());
            if let Some(body) = request.body() {
                builder = builder.body(body.clone());
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ProxyError::UpstreamUnreachable(e.to_string()))?;

            let status = response.status();
            let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
            let body = response
                .bytes()
                .await
                .map_err(|e| ProxyError::UpstreamUnreachable(e.to_string()))?;

            Ok(UpstreamResponse::new(status, content_type, body))
        }
        .boxed()
    }
}
