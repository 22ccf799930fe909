//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (resolve mount by longest prefix)
//!     → normalize.rs (segments after the mount prefix)
//!     → router.rs (exact table → pattern rules → verbatim fallback)
//!     → matcher.rs (segment patterns, template rendering)
//!     → Return: Rewrite { route, backend path, default query } or error
//!
//! Route Compilation (at startup):
//!     MountConfig[] / RouteConfig[]
//!     → Compile patterns and method sets
//!     → Sort mounts by prefix length
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always produces the same backend path
//! - First match wins (declaration order)

pub mod matcher;
pub mod normalize;
pub mod router;

pub use normalize::PathCapture;
pub use router::{MethodSet, Mount, Rewrite, RouteTable, Router, RouterError};
