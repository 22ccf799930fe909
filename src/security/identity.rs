//! Admin identity injection.
//!
//! The upstream authorizes every call from `X-Admin-Id` / `X-Admin-Role` and
//! performs no verification of its own, so whoever sets these headers holds
//! the identity. Two policies exist and exactly one is active per gateway:
//!
//! - [`IdentityPolicy::Fixed`]: the gateway is the trust boundary. A constant
//!   identity is asserted and caller-supplied headers are ignored entirely.
//! - [`IdentityPolicy::Forwarded`]: the gateway is a pass-through. Caller
//!   headers are relayed with the role case-normalized. This is only sound
//!   when an edge in front of the gateway authenticates callers and
//!   overwrites these headers.
//!
//! Either way the outbound request always carries both headers, possibly
//! empty-valued.

use axum::http::{HeaderMap, HeaderName};

use crate::config::schema::{IdentityConfig, IdentityPolicyKind, RoleCase};

pub const X_ADMIN_ID: HeaderName = HeaderName::from_static("x-admin-id");
pub const X_ADMIN_ROLE: HeaderName = HeaderName::from_static("x-admin-role");

/// Identity asserted to the upstream for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub id: String,
    pub role: String,
}

impl AdminIdentity {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityPolicy {
    Fixed(AdminIdentity),
    Forwarded { default_role: String, role_case: RoleCase },
}

impl IdentityPolicy {
    pub fn from_config(config: &IdentityConfig) -> Self {
        match config.policy {
            IdentityPolicyKind::Fixed => IdentityPolicy::Fixed(AdminIdentity::new(
                config.admin_id.clone(),
                config.admin_role.clone(),
            )),
            IdentityPolicyKind::Forwarded => IdentityPolicy::Forwarded {
                default_role: config.default_role.clone(),
                role_case: config.role_case,
            },
        }
    }

    pub fn kind(&self) -> IdentityPolicyKind {
        match self {
            IdentityPolicy::Fixed(_) => IdentityPolicyKind::Fixed,
            IdentityPolicy::Forwarded { .. } => IdentityPolicyKind::Forwarded,
        }
    }

    /// Resolve the identity for a request carrying `inbound` headers.
    pub fn resolve(&self, inbound: &HeaderMap) -> AdminIdentity {
        match self {
            IdentityPolicy::Fixed(identity) => identity.clone(),
            IdentityPolicy::Forwarded {
                default_role,
                role_case,
            } => {
                let id = header_text(inbound, &X_ADMIN_ID).unwrap_or_default();
                let role = header_text(inbound, &X_ADMIN_ROLE)
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| default_role.clone());

                let role = match role_case {
                    RoleCase::Upper => role.to_ascii_uppercase(),
                    RoleCase::Lower => role.to_ascii_lowercase(),
                };

                AdminIdentity { id, role }
            }
        }
    }
}

/// Header value as trimmed text. Non-visible-ASCII values count as absent.
fn header_text(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
}
