/*!
 * Bounded retry with a linearly increasing delay.
 */

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::errors::ProviderError;

/// How many times an operation is attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_retries: u32,
    /// Delay before the second attempt; attempt `n + 1` waits `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// Same delay, different attempt budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Attempt budget, never below one
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// Exhaustion yields `ProviderError::RetriesExhausted` carrying the
    /// number of attempts consumed.
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let attempts = self.attempts();
        let mut last_error = None;

        for attempt in 1..=attempts {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}/{}", operation_name, attempt, attempts);
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => {
                    warn!("{} failed with a non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{} attempt {}/{} failed: {}", operation_name, attempt, attempts, e);
                    last_error = Some(e);
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.delay_after(attempt)).await;
            }
        }

        Err(ProviderError::RetriesExhausted {
            operation: operation_name.to_string(),
            attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
