//! Retries with exponential backoff.
//!
//! Profile lookups go to a remote service that rate-limits and sometimes
//! times out. Lookups are retried with growing delays, and only errors the
//! caller marks as transient are retried.
//!
//! # Example
//!
//! ```rust,no_run
//! use guard_tasks::retry::{retry, RetryConfig};
//!
//! async fn example() -> Result<u32, String> {
//!     retry(&RetryConfig::fast(), || async { Ok(7) }).await
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// How often and how patiently to retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Wait before the second attempt
    pub initial_delay: Duration,

    /// Upper bound on any single wait
    pub max_delay: Duration,

    /// Factor applied to the wait after each failure
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// Short waits, for lookups against a local cache.
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            exponential_base: 2.0,
        }
    }

    /// The default policy.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Long waits, for a rate-limited remote profile service.
    pub fn slow() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            exponential_base: 2.0,
        }
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            exponential_base: 1.0,
        }
    }

    /// The wait after a given failed attempt (1-based).
    ///
    /// ```
    /// use guard_tasks::retry::RetryConfig;
    /// use std::time::Duration;
    ///
    /// let config = RetryConfig::standard();
    /// assert_eq!(config.delay_after(1), Duration::from_millis(100));
    /// assert_eq!(config.delay_after(3), Duration::from_millis(400));
    /// assert_eq!(config.delay_after(30), Duration::from_secs(10));
    /// ```
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.exponential_base.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Run an operation, retrying every failure.
///
/// Returns the first success, or the last error once `max_attempts` is used up.
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    retry_if(config, operation, |_| true).await
}

/// Run an operation, retrying only failures that `is_transient` accepts.
///
/// Other failures are returned at once.
pub async fn retry_if<F, Fut, T, E, P>(
    config: &RetryConfig,
    mut operation: F,
    mut is_transient: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
    P: FnMut(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_transient(&err) {
            debug!(error = ?err, "Error is not transient, giving up");
            return Err(err);
        }
        if attempt >= config.max_attempts {
            error!(attempts = attempt, error = ?err, "All retry attempts exhausted");
            return Err(err);
        }

        let delay = config.delay_after(attempt);
        warn!(
            attempt,
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = ?err,
            "Attempt failed, retrying"
        );
        sleep(delay).await;
    }
}
