//! Bounded retry with linear backoff for calls to the conversion service.

use std::future::Future;
use std::time::Duration;
use vodbridge_common::Error;

/// How many times to attempt an operation and how long to wait in between.
///
/// After failed attempt `n` the loop sleeps `n * base_delay` before trying
/// again, so the waits grow 1x, 2x, 3x...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub enum AttemptError {
    /// Worth trying again (transport failure, unexpected status).
    Transient(String),
    /// Stop immediately and surface this error.
    Fatal(Error),
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Run `op` until it succeeds, fails fatally, or attempts run out.
    ///
    /// When attempts are exhausted the last transient cause is returned as
    /// [`Error::Remote`].
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, Error>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transient(cause)) => {
                    if attempt >= max_attempts {
                        tracing::warn!(operation, attempt, error = %cause, "Giving up after final attempt");
                        return Err(Error::Remote(cause));
                    }

                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %cause,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
