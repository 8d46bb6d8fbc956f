use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{IndexerError, Result};

/// Bounded retry with exponential backoff and a per-attempt timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further retry
    pub initial_backoff: Duration,
    /// Deadline for a single attempt
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration, timeout: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            timeout,
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(2_u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500), Duration::from_secs(20))
    }
}

/// Run `op` until it succeeds, fails definitively, or retries run out.
///
/// An attempt that exceeds `policy.timeout` is abandoned and counts as a
/// transient failure. Only errors with [`IndexerError::is_transient`] are
/// retried.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(IndexerError::Timeout(policy.timeout)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy.backoff_for(attempt);
                warn!("{} attempt {} failed ({}), retrying in {:?}", label, attempt + 1, e, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_millis(200))
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = with_retry(&fast_policy(3), "test", || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(IndexerError::UpstreamStatus { status: 503, body: String::new() })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<()> = with_retry(&fast_policy(2), "test", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(IndexerError::RateLimited("429".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(IndexerError::RateLimited(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_definitive_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<()> = with_retry(&fast_policy(3), "test", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(IndexerError::UpstreamStatus { status: 403, body: "quotaExceeded".to_string() })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_transient() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(10));
        let result: Result<()> = with_retry(&policy, "test", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            }
        })
        .await;

        assert!(matches!(result, Err(IndexerError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
