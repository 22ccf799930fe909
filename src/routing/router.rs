//! Route lookup and rewriting.
//!
//! # Responsibilities
//! - Resolve the mount serving an inbound path (longest prefix wins)
//! - Rewrite normalized segments into the canonical backend path
//! - Gate methods per mount and per route before any upstream call
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc, no locks)
//! - O(1) exact lookup via HashMap, then an ordered scan of pattern rules
//! - First matching pattern wins; unmatched paths are forwarded verbatim
//! - Every rewritten path is placed under the mount's backend namespace

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::{EmptyBodyPolicy, GatewayConfig, MountConfig, RouteConfig};
use crate::error::ProxyError;
use crate::routing::matcher::{PatternError, SegmentPattern};

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    #[error("route `{route}` references `:{param}` which its name does not capture")]
    UnresolvedParam { route: String, param: String },
}

const KNOWN_METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// Methods accepted by a mount or route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet(Option<Vec<Method>>);

impl MethodSet {
    pub fn any() -> Self {
        Self(None)
    }

    pub fn only(methods: impl IntoIterator<Item = Method>) -> Self {
        Self(Some(methods.into_iter().collect()))
    }

    /// Parse configured method names; an empty list accepts any method.
    pub fn parse(names: &[String]) -> Result<Self, RouterError> {
        if names.is_empty() {
            return Ok(Self::any());
        }

        let methods = names
            .iter()
            .map(|name| {
                let upper = name.to_ascii_uppercase();
                KNOWN_METHODS
                    .iter()
                    .find(|m| m.as_str() == upper)
                    .cloned()
                    .ok_or_else(|| RouterError::UnknownMethod(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::only(methods))
    }

    pub fn allows(&self, method: &Method) -> bool {
        match &self.0 {
            None => true,
            Some(methods) => methods.contains(method),
        }
    }
}

/// A compiled route descriptor.
#[derive(Debug, Clone)]
pub struct Route {
    name: SegmentPattern,
    backend: SegmentPattern,
    methods: MethodSet,
    default_query: Vec<(String, String)>,
}

impl Route {
    pub fn compile(config: &RouteConfig) -> Result<Self, RouterError> {
        let name = SegmentPattern::parse(&config.name)?;
        let backend = SegmentPattern::parse(&config.backend)?;

        if let Some(param) = backend.params().find(|p| !name.params().any(|n| n == *p)) {
            return Err(RouterError::UnresolvedParam {
                route: config.name.clone(),
                param: param.to_string(),
            });
        }

        Ok(Self {
            name,
            backend,
            methods: MethodSet::parse(&config.methods)?,
            default_query: config
                .default_query
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Result of rewriting an inbound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Logical route name, `None` for verbatim pass-through.
    pub route: Option<String>,
    /// Canonical backend path, e.g. "/admin/rides/7/assign".
    pub path: String,
    /// Query parameters to add when absent from the caller's query.
    pub default_query: Vec<(String, String)>,
}

/// Route table of one mount.
#[derive(Debug, Clone)]
pub struct RouteTable {
    namespace: String,
    methods: MethodSet,
    exact: HashMap<String, Route>,
    patterns: Vec<Route>,
}

impl RouteTable {
    pub fn new(namespace: impl Into<String>, methods: MethodSet, routes: Vec<Route>) -> Self {
        let mut exact = HashMap::new();
        let mut patterns = Vec::new();

        for route in routes {
            if route.name.is_literal() {
                exact.insert(route.name().to_string(), route);
            } else {
                patterns.push(route);
            }
        }

        Self {
            namespace: namespace.into(),
            methods,
            exact,
            patterns,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Rewrite normalized segments into a backend path.
    pub fn rewrite(&self, segments: &[String], method: &Method) -> Result<Rewrite, ProxyError> {
        if segments.is_empty() {
            return Err(ProxyError::InvalidPath);
        }
        if !self.methods.allows(method) {
            return Err(ProxyError::MethodNotAllowed);
        }

        let joined = segments.join("/");

        let matched = self.exact.get(&joined).and_then(|route| {
            route
                .backend
                .render(&Default::default())
                .map(|path| (route, path))
        });

        let matched = matched.or_else(|| {
            self.patterns.iter().find_map(|route| {
                let params = route.name.matches(segments)?;
                route.backend.render(&params).map(|path| (route, path))
            })
        });

        let (route, relative) = match matched {
            Some((route, path)) => {
                if !route.methods.allows(method) {
                    return Err(ProxyError::MethodNotAllowed);
                }
                (Some(route), path)
            }
            None => (None, joined),
        };

        Ok(Rewrite {
            route: route.map(|r| r.name().to_string()),
            path: format!("/{}/{}", self.namespace, relative),
            default_query: route.map(|r| r.default_query.clone()).unwrap_or_default(),
        })
    }
}

/// An inbound prefix with its route table.
#[derive(Debug)]
pub struct Mount {
    pub name: String,
    pub prefix: String,
    pub failure_message: String,
    pub empty_body: EmptyBodyPolicy,
    pub table: RouteTable,
}

impl Mount {
    pub fn compile(config: &MountConfig) -> Result<Self, RouterError> {
        let routes = config
            .routes
            .iter()
            .map(Route::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name.clone(),
            prefix: config.prefix.trim_end_matches('/').to_string(),
            failure_message: config.failure_message.clone(),
            empty_body: config.empty_body,
            table: RouteTable::new(
                config.namespace.clone(),
                MethodSet::parse(&config.methods)?,
                routes,
            ),
        })
    }

    /// True if `path` equals the prefix or continues it with `/`.
    pub fn serves(&self, path: &str) -> bool {
        match path.strip_prefix(&self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Mount table for the whole gateway.
#[derive(Debug)]
pub struct Router {
    mounts: Vec<Arc<Mount>>,
    capture_key: String,
}

impl Router {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouterError> {
        let mut mounts = config
            .mounts
            .iter()
            .map(|m| Mount::compile(m).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        // Longest prefix first so "/api/admin/action" shadows "/api/admin".
        mounts.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Ok(Self {
            mounts,
            capture_key: config.routing.capture_key.clone(),
        })
    }

    /// Find the mount serving `path`.
    pub fn resolve(&self, path: &str) -> Option<Arc<Mount>> {
        self.mounts.iter().find(|m| m.serves(path)).cloned()
    }

    pub fn capture_key(&self) -> &str {
        &self.capture_key
    }

    pub fn mounts(&self) -> impl Iterator<Item = &Arc<Mount>> {
        self.mounts.iter()
    }
}
