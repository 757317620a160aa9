//! Timeout utilities for browser and network operations
//!
//! Every suspending step in the pipeline goes through here so a hung page
//! or model call cannot block a request indefinitely. Dropping the inner
//! future on expiry cancels the in-flight work.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Wrap an async operation with an explicit deadline
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err` - Either the operation failed or the deadline was reached
pub async fn with_timeout<F, T>(operation: F, limit: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {}ms",
            limit.as_millis()
        )),
    }
}

/// Short request identifier threaded through log lines
#[must_use]
pub fn new_request_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("req_{}", &id[..8])
}
