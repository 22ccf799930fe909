//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Serve on a listener until the shutdown notice arrives

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::handlers::{assign_driver, proxy_handler, ASSIGN_DRIVER_PATH};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::notified;
use crate::routing::{Router as MountRouter, RouterError};
use crate::security::IdentityPolicy;
use crate::upstream::{HttpUpstream, Upstream};

/// Startup failures of the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("route table: {0}")]
    Routes(#[from] RouterError),

    #[error("upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<MountRouter>,
    pub identity: Arc<IdentityPolicy>,
    pub upstream: Arc<dyn Upstream>,
    pub upstream_timeout: Duration,
    pub max_body_bytes: usize,
}

/// HTTP server for the admin gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server forwarding over HTTP to `config.upstream.base_url`.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);
        Self::with_upstream(config, upstream)
    }

    /// Create a server with a custom upstream.
    pub fn with_upstream(config: GatewayConfig, upstream: Arc<dyn Upstream>) -> Result<Self, ServerError> {
        let mounts = MountRouter::from_config(&config)?;
        for mount in mounts.mounts() {
            tracing::debug!(
                mount = %mount.name,
                prefix = %mount.prefix,
                namespace = %mount.table.namespace(),
                "Mount registered"
            );
        }

        let identity = IdentityPolicy::from_config(&config.identity);
        tracing::debug!(identity_policy = ?identity.kind(), "Identity policy resolved");

        let state = AppState {
            router: Arc::new(mounts),
            identity: Arc::new(identity),
            upstream,
            upstream_timeout: Duration::from_secs(config.upstream.timeout_secs),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(ASSIGN_DRIVER_PATH, any(assign_driver))
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.limits.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for driving without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            identity_policy = ?self.config.identity.policy,
            mounts = self.config.mounts.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(notified(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::IdentityPolicyKind;
    use crate::error::ProxyError;
    use crate::security::identity::{X_ADMIN_ID, X_ADMIN_ROLE};
    use crate::upstream::{ForwardRequest, UpstreamResponse};
    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Method, Request, StatusCode};
    use futures_util::future::{BoxFuture, FutureExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Upstream double that records every call and answers with a canned reply.
    struct MockUpstream {
        calls: AtomicUsize,
        seen: Mutex<Vec<ForwardRequest>>,
        reply: Result<UpstreamResponse, ()>,
    }

    impl MockUpstream {
        fn answering(status: StatusCode, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                reply: Ok(UpstreamResponse::new(
                    status,
                    Some(HeaderValue::from_static("application/json")),
                    body,
                )),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                reply: Err(()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last(&self) -> ForwardRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Upstream for MockUpstream {
        fn forward(&self, request: ForwardRequest) -> BoxFuture<'_, Result<UpstreamResponse, ProxyError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request);
            let reply = self
                .reply
                .clone()
                .map_err(|_| ProxyError::UpstreamUnreachable("connection refused".into()));
            async move { reply }.boxed()
        }
    }

    /// Upstream that never answers and flags when its future is dropped.
    struct HangingUpstream {
        dropped: Arc<AtomicUsize>,
    }

    struct DropFlag(Arc<AtomicUsize>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Upstream for HangingUpstream {
        fn forward(&self, _request: ForwardRequest) -> BoxFuture<'_, Result<UpstreamResponse, ProxyError>> {
            let flag = DropFlag(self.dropped.clone());
            async move {
                let _flag = flag;
                std::future::pending::<()>().await;
                Err(ProxyError::UpstreamTimeout(Duration::ZERO))
            }
            .boxed()
        }
    }

    fn app(config: GatewayConfig, upstream: Arc<dyn Upstream>) -> Router {
        HttpServer::with_upstream(config, upstream).unwrap().router()
    }

    async fn call(router: Router, method: Method, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_get_overview_rewritten_with_default_city() {
        let upstream = MockUpstream::answering(StatusCode::OK, r#"{"activeRides":3}"#);
        let router = app(GatewayConfig::default(), upstream.clone());

        let (status, body) = call(router, Method::GET, "/api/admin/dashboard-overview", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "activeRides": 3 }));

        let sent = upstream.last();
        assert_eq!(sent.method(), Method::GET);
        assert_eq!(sent.path(), "/admin/dashboard/overview");
        assert_eq!(sent.query_string().as_deref(), Some("city=Austin%2C+TX"));
        assert!(sent.body().is_none());
    }

    #[tokio::test]
    async fn test_fixed_identity_headers_sent() {
        let upstream = MockUpstream::answering(StatusCode::OK, "[]");
        let router = app(GatewayConfig::default(), upstream.clone());

        let request = Request::builder()
            .uri("/api/admin/drivers")
            .header("x-admin-id", "mallory")
            .header("x-admin-role", "SUPER_ADMIN")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let sent = upstream.last();
        assert_eq!(sent.path(), "/admin/drivers");
        assert_eq!(sent.headers().get(X_ADMIN_ID).unwrap(), "vercel_admin");
        assert_eq!(sent.headers().get(X_ADMIN_ROLE).unwrap(), "super_admin");
        assert!(sent.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_forwarded_identity_headers_sent() {
        let mut config = GatewayConfig::default();
        config.identity.policy = IdentityPolicyKind::Forwarded;
        let upstream = MockUpstream::answering(StatusCode::OK, "{}");
        let router = app(config, upstream.clone());

        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/api/admin/riders/r9/wallet")
            .header("x-admin-id", "greg_pessoni")
            .header("x-admin-role", "admin")
            .body(Body::from(r#"{"amount":5}"#))
            .unwrap();
        router.oneshot(request).await.unwrap();

        let sent = upstream.last();
        assert_eq!(sent.path(), "/admin/riders/r9/wallet");
        assert_eq!(sent.headers().get(X_ADMIN_ID).unwrap(), "greg_pessoni");
        assert_eq!(sent.headers().get(X_ADMIN_ROLE).unwrap(), "ADMIN");
        assert_eq!(sent.body().unwrap().as_ref(), br#"{"amount":5}"#);
    }

    #[tokio::test]
    async fn test_method_gate_never_calls_upstream() {
        let upstream = MockUpstream::answering(StatusCode::OK, "{}");
        let router = app(GatewayConfig::default(), upstream.clone());

        let (status, body) = call(router.clone(), Method::GET, "/api/admin/action/rides/7/cancel", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, serde_json::json!({ "error": "Method not allowed" }));

        let (status, _) = call(router, Method::POST, "/api/admin/dashboard-overview", "{}").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_body_stripped() {
        let upstream = MockUpstream::answering(StatusCode::OK, "[]");
        let router = app(GatewayConfig::default(), upstream.clone());

        call(router, Method::GET, "/api/admin/logs", r#"{"smuggled":true}"#).await;
        assert!(upstream.last().body().is_none());
    }

    #[tokio::test]
    async fn test_action_empty_body_becomes_success() {
        let upstream = MockUpstream::answering(StatusCode::OK, "");
        let router = app(GatewayConfig::default(), upstream.clone());

        let (status, body) = call(router, Method::PATCH, "/api/admin/action/drivers/d1/status", r#"{"status":"OFFLINE"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "success": true }));
        assert_eq!(upstream.last().path(), "/admin/drivers/d1/status");
    }

    #[tokio::test]
    async fn test_upstream_status_relayed() {
        let upstream = MockUpstream::answering(StatusCode::NOT_FOUND, r#"{"error":"no such ride"}"#);
        let router = app(GatewayConfig::default(), upstream);

        let (status, body) = call(router, Method::GET, "/api/admin/rides/404", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "error": "no such ride" }));
    }

    #[tokio::test]
    async fn test_unreachable_gives_generic_500() {
        let router = app(GatewayConfig::default(), MockUpstream::unreachable());

        let (status, body) = call(router.clone(), Method::GET, "/api/admin/drivers", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "Proxy request failed" }));

        let (status, body) = call(router, Method::POST, "/api/ai/draft-response", "{}").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "AI Service proxy failed" }));
    }

    #[tokio::test]
    async fn test_unmounted_path_is_404() {
        let upstream = MockUpstream::answering(StatusCode::OK, "{}");
        let router = app(GatewayConfig::default(), upstream.clone());

        let (status, body) = call(router.clone(), Method::GET, "/api/administrator", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "error": "Not found" }));

        let (status, _) = call(router, Method::GET, "/", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_bare_mount_is_invalid_path() {
        let upstream = MockUpstream::answering(StatusCode::OK, "{}");
        let router = app(GatewayConfig::default(), upstream.clone());

        let (status, body) = call(router, Method::GET, "/api/admin", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "Invalid path" }));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_capture_query_segments() {
        let upstream = MockUpstream::answering(StatusCode::OK, "{}");
        let router = app(GatewayConfig::default(), upstream.clone());

        call(router, Method::GET, "/api/admin?path=riders&path=r3&verbose=1", "").await;
        let sent = upstream.last();
        assert_eq!(sent.path(), "/admin/rides/r3");
        assert_eq!(sent.query_string().as_deref(), Some("verbose=1"));
    }

    #[tokio::test]
    async fn test_dot_segments_never_leave_mount() {
        let upstream = MockUpstream::answering(StatusCode::OK, "{}");
        let router = app(GatewayConfig::default(), upstream.clone());

        for uri in [
            "/api/admin/action/../../ai/x",
            "/api/ai/%2e%2e/admin/drivers/1/status",
            "/api/ai/.%2E/admin/dashboard/overview",
            "/api/admin?path=..&path=ai&path=secret",
            "/api/admin?path=rides%3Fx&path=cancel",
        ] {
            let (status, body) = call(router.clone(), Method::POST, uri, "").await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, serde_json::json!({ "error": "Invalid path" }), "{uri}");
        }
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_assign_driver() {
        let upstream = MockUpstream::answering(StatusCode::OK, r#"{"assigned":true}"#);
        let router = app(GatewayConfig::default(), upstream.clone());

        let (status, body) = call(
            router,
            Method::POST,
            "/api/admin/assign-driver",
            r#"{"rideId":"r-42","payload":{"driverId":"d7"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "assigned": true }));

        let sent = upstream.last();
        assert_eq!(sent.method(), Method::POST);
        assert_eq!(sent.path(), "/admin/rides/r-42/assign");
        let payload: serde_json::Value = serde_json::from_slice(sent.body().unwrap()).unwrap();
        assert_eq!(payload, serde_json::json!({ "driverId": "d7" }));
    }

    #[tokio::test]
    async fn test_assign_driver_rejections() {
        let upstream = MockUpstream::answering(StatusCode::OK, "{}");
        let router = app(GatewayConfig::default(), upstream.clone());

        let (status, _) = call(router.clone(), Method::GET, "/api/admin/assign-driver", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, body) = call(router.clone(), Method::POST, "/api/admin/assign-driver", r#"{"rideId":"r1"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "Missing parameters" }));

        let (status, _) = call(router.clone(), Method::POST, "/api/admin/assign-driver", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            router.clone(),
            Method::POST,
            "/api/admin/assign-driver",
            r#"{"rideId":"r1/cancel","payload":{}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "Invalid path" }));

        let (status, body) = call(
            router.clone(),
            Method::POST,
            "/api/admin/assign-driver",
            r#"{"rideId":"..","payload":{"driverId":"d7"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "Invalid path" }));

        for payload in ["false", "0", r#""""#, "null"] {
            let body = format!(r#"{{"rideId":"r1","payload":{payload}}}"#);
            let (status, body) = call(router.clone(), Method::POST, "/api/admin/assign-driver", &body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
            assert_eq!(body, serde_json::json!({ "error": "Missing parameters" }));
        }

        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = GatewayConfig::default();
        config.limits.max_body_bytes = 16;
        let upstream = MockUpstream::answering(StatusCode::OK, "{}");
        let router = app(config, upstream.clone());

        let (status, _) = call(router, Method::POST, "/api/ai/draft-response", &"x".repeat(64)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_dropped_request_cancels_upstream_call() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let upstream = Arc::new(HangingUpstream { dropped: dropped.clone() });
        let router = app(GatewayConfig::default(), upstream);

        let request = Request::builder()
            .uri("/api/admin/logs")
            .body(Body::empty())
            .unwrap();
        let pending = router.oneshot(request);

        // Caller gives up before the upstream answers.
        let result = tokio::time::timeout(Duration::from_millis(50), pending).await;
        assert!(result.is_err());
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }
}
