//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every backend placeholder is captured by its route name
//! - Validate value ranges (timeouts > 0, URL schemes)
//! - Detect conflicting mounts and routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, IdentityPolicyKind};
use crate::routing::normalize::check_segment;
use crate::routing::router::{MethodSet, Route, RouterError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("upstream.base_url `{0}` is not an http(s) URL")]
    UpstreamUrl(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("mount `{mount}`: {reason}")]
    Mount { mount: String, reason: String },

    #[error("mount `{mount}`, route `{route}`: {reason}")]
    Route {
        mount: String,
        route: String,
        reason: String,
    },

    #[error("identity.{field} is not a valid header value")]
    IdentityValue { field: &'static str },

    #[error("limits.request_timeout_secs ({request}) must exceed upstream.timeout_secs ({upstream})")]
    TimeoutOrder { request: u64, upstream: u64 },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::UpstreamUrl(config.upstream.base_url.clone())),
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("upstream.timeout_secs"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("upstream.connect_timeout_secs"));
    }
    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("limits.request_timeout_secs"));
    }
    // The request deadline wraps the upstream one; it must fire second.
    let (request, upstream) = (config.limits.request_timeout_secs, config.upstream.timeout_secs);
    if request > 0 && upstream > 0 && request <= upstream {
        errors.push(ValidationError::TimeoutOrder { request, upstream });
    }

    if config.identity.policy == IdentityPolicyKind::Fixed {
        if HeaderValue::from_str(&config.identity.admin_id).is_err() {
            errors.push(ValidationError::IdentityValue { field: "admin_id" });
        }
        if HeaderValue::from_str(&config.identity.admin_role).is_err() {
            errors.push(ValidationError::IdentityValue { field: "admin_role" });
        }
    } else if HeaderValue::from_str(&config.identity.default_role).is_err() {
        errors.push(ValidationError::IdentityValue { field: "default_role" });
    }

    let mut prefixes = HashSet::new();
    for mount in &config.mounts {
        let mount_error = |reason: String| ValidationError::Mount {
            mount: mount.name.clone(),
            reason,
        };

        if !mount.prefix.starts_with('/') || mount.prefix.len() < 2 {
            errors.push(mount_error("prefix must start with `/` and name a path".into()));
        }
        if mount.prefix.len() > 1 && mount.prefix.ends_with('/') {
            errors.push(mount_error("prefix must not end with `/`".into()));
        }
        if !prefixes.insert(mount.prefix.trim_end_matches('/')) {
            errors.push(mount_error(format!("duplicate prefix `{}`", mount.prefix)));
        }
        if mount.namespace.is_empty() || mount.namespace.contains('/') || check_segment(&mount.namespace).is_err() {
            errors.push(mount_error("namespace must be a single non-empty segment".into()));
        }
        if let Err(e) = MethodSet::parse(&mount.methods) {
            errors.push(mount_error(e.to_string()));
        }

        let mut names = HashSet::new();
        for route in &mount.routes {
            let route_error = |reason: String| ValidationError::Route {
                mount: mount.name.clone(),
                route: route.name.clone(),
                reason,
            };

            if !names.insert(route.name.as_str()) {
                errors.push(route_error("duplicate route name".into()));
            }

            match Route::compile(route) {
                Ok(_) => {}
                Err(RouterError::UnresolvedParam { param, .. }) => errors.push(route_error(
                    format!("backend placeholder `:{}` is not captured by the route name", param),
                )),
                Err(e) => errors.push(route_error(e.to_string())),
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
