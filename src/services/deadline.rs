//! Deadline enforcement for service operations.

use crate::error::AppError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Longest wait a deadline can express, about thirty years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Run `fut` until `deadline`.
///
/// On expiry the future is dropped, which rolls back any unit of work it
/// still holds, and the call fails with [`AppError::Timeout`].
pub async fn with_deadline<T, F>(
    operation: &'static str,
    deadline: Instant,
    fut: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("[deadline] {} did not finish before its deadline", operation);
            Err(AppError::timeout(operation))
        }
    }
}

/// Deadline `timeout` from now. Timeouts past [`FAR_FUTURE`] are capped to it.
pub fn after(timeout: Duration) -> Instant {
    Instant::now() + timeout.min(FAR_FUTURE)
}

/// Deadline `secs` seconds from now.
pub fn after_secs(secs: u64) -> Instant {
    after(Duration::from_secs(secs))
}
