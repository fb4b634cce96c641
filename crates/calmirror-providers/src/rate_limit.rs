//! Sliding-window rate limiting for API calls.
//!
//! Google allows 1000 requests per 100 seconds per user. [`RateLimiter`]
//! records the instant of each admitted request and makes callers wait until
//! the oldest one leaves the window once the quota is used up.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

pub const DEFAULT_MAX_REQUESTS: usize = 1000;
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(100_000);

/// Rounds in one [`RateLimiter::acquire`] that may wake to find the same
/// oldest request still inside the window. That only happens when the timer
/// fires early or the clock misbehaves; losing a freed slot to another
/// waiter does not count, so the bound is independent of contention.
const MAX_STALLED_ROUNDS: usize = 16;

/// Sliding-window request limiter.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<VecDeque<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    /// Creates a limiter admitting `max_requests` per rolling `window`.
    ///
    /// A zero quota is treated as one.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            requests: Mutex::new(VecDeque::new()),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Waits until one more request fits in the window, then records it.
    ///
    /// # Errors
    ///
    /// Returns a rate-limited error if waiting stops making progress for
    /// several rounds in a row.
    pub async fn acquire(&self) -> ProviderResult<()> {
        let mut waited_on: Option<Instant> = None;
        let mut stalled = 0;
        loop {
            let wait = {
                let mut requests = self.requests.lock().await;
                let now = Instant::now();
                while let Some(oldest) = requests.front() {
                    if now.duration_since(*oldest) >= self.window {
                        requests.pop_front();
                    } else {
                        break;
                    }
                }

                match requests.front().copied() {
                    Some(oldest) if requests.len() >= self.max_requests => {
                        if waited_on == Some(oldest) {
                            stalled += 1;
                            if stalled >= MAX_STALLED_ROUNDS {
                                return Err(ProviderError::rate_limited(
                                    "local rate limit still exhausted after waiting",
                                ));
                            }
                        } else {
                            stalled = 0;
                        }
                        waited_on = Some(oldest);
                        self.window.saturating_sub(now.duration_since(oldest))
                    }
                    _ => {
                        requests.push_back(now);
                        return Ok(());
                    }
                }
            };

            debug!("rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of requests currently inside the window.
    pub async fn in_flight(&self) -> usize {
        let requests = self.requests.lock().await;
        let now = Instant::now();
        requests
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count()
    }

    /// Forgets all recorded requests.
    pub async fn reset(&self) {
        self.requests.lock().await.clear();
    }
}
