//! Retry policy with per-failure-class back-off.
//!
//! Rate limits and generic server errors back off linearly; overload
//! backs off exponentially. Permanent errors fail fast, and exhausting
//! the retry budget re-raises the last transient error.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::error::ClaudeApiError;

use crate::domain::models::config::RetryConfig;

/// Retry policy for Messages API requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    max_retries: u32,

    /// Linear back-off base for rate-limit errors
    rate_limit_base: Duration,

    /// Exponential back-off base for overload errors
    overload_base: Duration,

    /// Linear back-off base for other transient server errors
    server_error_base: Duration,
}

impl RetryPolicy {
    pub fn new(
        max_retries: u32,
        rate_limit_base: Duration,
        overload_base: Duration,
        server_error_base: Duration,
    ) -> Self {
        Self {
            max_retries,
            rate_limit_base,
            overload_base,
            server_error_base,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.rate_limit_backoff_ms),
            Duration::from_millis(config.overload_backoff_ms),
            Duration::from_millis(config.server_error_backoff_ms),
        )
    }

    /// Execute an operation, retrying transient failures.
    ///
    /// `attempt` counts completed failures: the first retry waits the
    /// base duration, the second twice that (linear classes) or double
    /// (exponential class), and so on.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ClaudeApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClaudeApiError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "request succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    attempt += 1;
                    if !err.is_transient() || attempt >= self.max_retries {
                        if err.is_transient() {
                            warn!(attempts = attempt, error = %err, "retry budget exhausted");
                        }
                        return Err(err);
                    }

                    let backoff = self.backoff_for(&err, attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient error, backing off"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    /// Back-off duration before retry number `attempt` (1-based).
    fn backoff_for(&self, error: &ClaudeApiError, attempt: u32) -> Duration {
        match error {
            // Linear: base, 2*base, 3*base, ...
            ClaudeApiError::RateLimitExceeded => self.rate_limit_base * attempt,
            // Exponential: base, 2*base, 4*base, ...
            ClaudeApiError::Overloaded => self.overload_base * 2_u32.saturating_pow(attempt - 1),
            // Linear, shorter base
            _ => self.server_error_base * attempt,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
