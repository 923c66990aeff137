//! Retry policy for backend reads.

use std::{future::Future, time::Duration};

use tracing::warn;

use crate::backend::BackendError;

/// Default number of extra attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Fixed-delay retry of retryable [`BackendError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Retry up to `max_retries` times, waiting `delay` before each retry.
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Never retry.
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Extra attempts allowed after the first.
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Pause between attempts.
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a failure on the given zero-based attempt should be retried.
    pub fn should_retry(&self, attempt: u32, error: &BackendError) -> bool {
        attempt < self.max_retries && error.is_retryable()
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or runs out of
    /// retries. The last error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if self.should_retry(attempt, &error) => {
                    warn!(attempt, %error, delay_ms = self.delay.as_millis(), "retrying");

                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
