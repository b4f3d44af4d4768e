//! Timeout Helpers
//!
//! Wraps async operations in `tokio::time::timeout` and converts expiry into
//! a [`NeuroError::Timeout`]. Dropping the inner future on expiry is the only
//! cancellation performed; work already handed to a spawned task keeps going.

use std::future::Future;
use std::time::Duration;

use crate::types::{NeuroError, Result};

/// Execute an async operation with a timeout
///
/// ```ignore
/// let body = with_timeout(
///     Duration::from_secs(30),
///     async { fetch().await },
///     "fetch models",
/// ).await?;
/// ```
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(NeuroError::timeout(operation_name, timeout)),
    }
}

/// Like [`with_timeout`] for futures whose output is not a crate `Result`
pub async fn with_timeout_map<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(NeuroError::timeout(operation_name, timeout)),
    }
}
