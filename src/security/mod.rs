//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → identity.rs (resolve admin identity under the active policy)
//!     → headers.rs (build the outbound header set from scratch)
//!     → Pass to the upstream forwarder
//! ```
//!
//! # Design Decisions
//! - One identity policy per gateway, default: do not trust the caller
//! - No inbound header is forwarded implicitly
//! - This is not an authentication layer: callers are never verified here

pub mod headers;
pub mod identity;

pub use identity::{AdminIdentity, IdentityPolicy};
