//! Bounded retry with exponential backoff for transient API failures.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ProviderResult;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// How often and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay before the attempt following failed attempt `attempt` (0-based):
    /// `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts are used up.
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> ProviderResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} succeeded on attempt {}", what, attempt + 1);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        "{} attempt {} failed ({}), retrying in {:?}",
                        what,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!("{} failed after {} attempts: {}", what, attempt + 1, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderErrorCode};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_server_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let counter = calls.clone();
        let result = RetryPolicy::default()
            .run("list", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ProviderError::from_status(503, "unavailable"))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: ProviderResult<()> = RetryPolicy::default()
            .run("list", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::from_status(429, "slow down"))
                }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::RateLimited);
        assert_eq!(err.status(), Some(429));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_client_errors() {
        for status in [401, 403, 404, 410] {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = calls.clone();
            let result: ProviderResult<()> = RetryPolicy::default()
                .run("list", || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(ProviderError::from_status(status, "no"))
                    }
                })
                .await;
            assert_eq!(result.unwrap_err().status(), Some(status));
            assert_eq!(calls.load(Ordering::SeqCst), 1, "status {status}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn none_policy_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let _ = RetryPolicy::none()
            .run("insert", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(ProviderError::server("boom"))
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
