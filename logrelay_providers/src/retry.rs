use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Exponential backoff policy: base `initial_delay`, factor 2, no cap, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Delay before the `retry`-th retry (1-based): `initial_delay * 2^(retry-1)`.
    ///
    /// Saturates at `Duration::MAX` instead of overflowing.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Retry an async operation with exponential backoff.
///
/// # Arguments
/// * `operation` - Called once per attempt with the 1-based attempt number
/// * `policy` - Retry budget and base delay
///
/// # Returns
/// The result of the first successful attempt, or the error of the last
/// attempt once the retry budget is exhausted
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    policy: &RetryPolicy,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) if attempt > policy.max_retries => return Err(e),
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "Request failed (attempt {attempt}/{}): {e}. Retrying after {}ms...",
                    policy.max_attempts(),
                    delay.as_millis()
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
