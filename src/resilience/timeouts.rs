//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a deadline
//! - Cancel the call cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Timeout errors are distinct from other errors (logged and counted
//!   separately) but reach the caller as the same generic 500

use std::future::Future;
use std::time::Duration;

use crate::error::ProxyError;

/// Run `call` with a deadline.
pub async fn with_deadline<F, T>(deadline: Duration, call: F) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, ProxyError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ProxyError::UpstreamTimeout(deadline)),
    }
}
