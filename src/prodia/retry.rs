//! Bounded retry with linear backoff around a single outbound call.
use std::future::Future;
use std::time::Duration;

use crate::error::AppResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub step: Duration,
}

impl RetryPolicy {
    /// `attempts` tries in total; after failed attempt `n` wait `step * n`.
    pub fn linear(attempts: u32, step: Duration) -> Self {
        RetryPolicy { attempts: attempts.max(1), step }
    }

    pub fn once() -> Self {
        RetryPolicy { attempts: 1, step: Duration::ZERO }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.step * attempt
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. The last error is returned as is.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.attempts && e.is_retryable() => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        target: "prodia_tools::retry",
                        label,
                        attempt,
                        max_attempts = self.attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::linear(3, Duration::from_secs(1))
    }
}
