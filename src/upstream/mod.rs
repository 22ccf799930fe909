//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! Rewrite + identity + inbound body/query
//!     → request.rs (ForwardRequest: method, path, query, body, headers)
//!     → client.rs (Upstream::forward, one HTTP exchange)
//!     → UpstreamResponse (status, content type, raw body)
//!     → http/response.rs (relay to caller)
//! ```

pub mod client;
pub mod request;

pub use client::{HttpUpstream, Upstream, UpstreamResponse};
pub use request::{forward_query, ForwardRequest};
