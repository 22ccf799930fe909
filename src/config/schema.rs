//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! the defaults reproduce the production deployment in front of
//! `app.share-rides.com`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the admin gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream backend settings.
    pub upstream: UpstreamConfig,

    /// Which admin identity is asserted to the upstream.
    pub identity: IdentityConfig,

    /// Path capture settings shared by all mounts.
    pub routing: RoutingConfig,

    /// Inbound prefixes and their route tables.
    pub mounts: Vec<MountConfig>,

    /// Request size and deadline limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            identity: IdentityConfig::default(),
            routing: RoutingConfig::default(),
            mounts: default_mounts(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and host of the backend, optionally with a base path.
    pub base_url: String,

    /// Deadline for a whole upstream exchange in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Honor `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub use_env_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.share-rides.com".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
            use_env_proxy: true,
        }
    }
}

/// Trust model for the `X-Admin-Id` / `X-Admin-Role` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityPolicyKind {
    /// The gateway asserts a constant identity and ignores caller headers.
    Fixed,
    /// Caller-supplied headers are relayed after role normalization.
    /// Only safe when an edge in front of the gateway has authenticated them.
    Forwarded,
}

/// Canonical case applied to forwarded roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleCase {
    Upper,
    Lower,
}

/// Identity injection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Active policy. Exactly one applies to the whole gateway.
    pub policy: IdentityPolicyKind,

    /// Admin id asserted under the fixed policy.
    pub admin_id: String,

    /// Admin role asserted under the fixed policy.
    pub admin_role: String,

    /// Role used under the forwarded policy when the caller sends none.
    pub default_role: String,

    /// Case normalization for forwarded roles.
    pub role_case: RoleCase,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            policy: IdentityPolicyKind::Fixed,
            admin_id: "vercel_admin".to_string(),
            admin_role: "super_admin".to_string(),
            default_role: String::new(),
            role_case: RoleCase::Upper,
        }
    }
}

/// Path capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Query key a fronting rewriter may use to deliver path segments.
    /// Never forwarded upstream.
    pub capture_key: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            capture_key: "path".to_string(),
        }
    }
}

/// What to relay when the upstream answers with an empty body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmptyBodyPolicy {
    /// Relay the empty body unchanged.
    #[default]
    Passthrough,
    /// Substitute `{"success":true}`.
    Success,
}

/// An inbound prefix served by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MountConfig {
    /// Mount identifier for logging/metrics.
    pub name: String,

    /// Inbound path prefix (e.g., "/api/admin"), no trailing slash.
    pub prefix: String,

    /// Backend namespace every rewritten path is placed under (e.g., "admin").
    pub namespace: String,

    /// Methods accepted on this mount. Empty means any.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Message returned with a 500 when the upstream call fails.
    #[serde(default = "default_failure_message")]
    pub failure_message: String,

    /// Empty upstream body handling.
    #[serde(default)]
    pub empty_body: EmptyBodyPolicy,

    /// Route descriptors. Literal names are looked up exactly; names with
    /// `:param` segments are pattern rules tried in order.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

fn default_failure_message() -> String {
    crate::error::DEFAULT_FAILURE_MESSAGE.to_string()
}

/// Route descriptor mapping a logical route name to a backend template.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Logical route name, e.g. "dashboard-overview" or "rides/:id/assign".
    pub name: String,

    /// Backend path template relative to the mount namespace.
    pub backend: String,

    /// Methods accepted on this route. Empty means any.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Query parameters added when the caller does not supply them.
    #[serde(default)]
    pub default_query: BTreeMap<String, String>,
}

impl RouteConfig {
    /// Route accepting any method with no default query.
    pub fn new(name: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend: backend.into(),
            methods: Vec::new(),
            default_query: BTreeMap::new(),
        }
    }

    pub fn with_methods(mut self, methods: &[&str]) -> Self {
        self.methods = methods.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_default_query(mut self, key: &str, value: &str) -> Self {
        self.default_query.insert(key.to_string(), value.to_string());
        self
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,

    /// Outer deadline for a whole inbound request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            request_timeout_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

const DEFAULT_CITY: &str = "Austin, TX";

/// The three mounts of the production deployment.
pub fn default_mounts() -> Vec<MountConfig> {
    vec![
        MountConfig {
            name: "admin-action".to_string(),
            prefix: "/api/admin/action".to_string(),
            namespace: "admin".to_string(),
            methods: ["PATCH", "POST", "PUT", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            failure_message: "Admin action proxy failed".to_string(),
            empty_body: EmptyBodyPolicy::Success,
            routes: Vec::new(),
        },
        MountConfig {
            name: "admin".to_string(),
            prefix: "/api/admin".to_string(),
            namespace: "admin".to_string(),
            methods: Vec::new(),
            failure_message: default_failure_message(),
            empty_body: EmptyBodyPolicy::Passthrough,
            routes: vec![
                RouteConfig::new("dashboard-overview", "dashboard/overview")
                    .with_methods(&["GET"])
                    .with_default_query("city", DEFAULT_CITY),
                RouteConfig::new("live-fleet", "live-fleet")
                    .with_methods(&["GET"])
                    .with_default_query("city", DEFAULT_CITY),
                RouteConfig::new("rides-active", "rides/active"),
                RouteConfig::new("logs", "logs"),
                RouteConfig::new("drivers", "drivers"),
                RouteConfig::new("riders", "riders"),
                RouteConfig::new("riders/active", "rides/active"),
                RouteConfig::new("drivers/:id/status", "drivers/:id/status"),
                RouteConfig::new("rides/:id/assign", "rides/:id/assign"),
                RouteConfig::new("rides/:id/cancel", "rides/:id/cancel"),
                RouteConfig::new("riders/:id/wallet", "riders/:id/wallet"),
                RouteConfig::new("rides/:id", "rides/:id"),
                RouteConfig::new("riders/:id/assign", "rides/:id/assign"),
                RouteConfig::new("riders/:id", "rides/:id").with_methods(&["GET"]),
            ],
        },
        MountConfig {
            name: "ai".to_string(),
            prefix: "/api/ai".to_string(),
            namespace: "ai".to_string(),
            methods: Vec::new(),
            failure_message: "AI Service proxy failed".to_string(),
            empty_body: EmptyBodyPolicy::Passthrough,
            routes: Vec::new(),
        },
    ]
}
