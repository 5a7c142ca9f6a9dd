use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{MonitorError, Result};

const RETRY_DELAY_MS: u64 = 250;

/// Run an async operation with a small bounded retry.
///
/// `DataUnavailable` is a definitive answer for this cycle, not a transient
/// transport fault, so it is returned immediately without another attempt.
pub async fn retry_async<F, Fut, T>(
    operation_name: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= max_attempts || matches!(e, MonitorError::DataUnavailable(_)) {
                    return Err(e);
                }
                warn!(
                    "{} attempt {}/{} failed: {}. Retrying",
                    operation_name, attempt, max_attempts, e
                );
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = retry_async("op", 2, || {
            let n = calls.fetch_add(1, Ordering::Relaxed);
            async move {
                if n == 0 {
                    Err(MonitorError::Fetch("transient".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_async("op", 2, || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(MonitorError::Fetch("down".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_data_unavailable_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_async("op", 3, || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(MonitorError::DataUnavailable("no numbers".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(MonitorError::DataUnavailable(_))));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
