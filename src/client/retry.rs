//! # Retry Logic and Backoff Strategies
//!
//! Bounded retry for requests that fail before an HTTP exchange completes.
//!
//! Only transport failures are retried. A completed response, even one with a
//! non-2xx status or a `success: false` body, is returned to the caller as is.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use artline::client::retry::RetryPolicy;
//!
//! # async fn example(client: reqwest::Client) {
//! let policy = RetryPolicy::default();
//! let result = policy
//!     .run("GET /api/images", || client.get("http://localhost:5000/api/images").send())
//!     .await;
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

/// Backoff strategy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed interval between attempts
    Fixed {
        /// Wait between attempts
        interval: Duration,
    },
    /// Doubling interval, capped
    Exponential {
        /// Wait before the second attempt
        base: Duration,
        /// Upper bound on any single wait
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Wait before attempt `attempt + 1`, given `attempt` (1-based) has just failed
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed { interval } => *interval,
            BackoffStrategy::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(*max)
            }
        }
    }
}

/// Transport error surviving every attempt
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Attempts made
    pub attempts: u32,
    /// Error from the final attempt
    pub last_error: E,
}

/// Retry budget and backoff for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait between attempts
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Fixed-interval policy
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: BackoffStrategy::Fixed { interval },
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Run `attempt` until it succeeds or the budget is spent.
    ///
    /// `label` is only used for logging.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut attempt: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut tried = 0;
        loop {
            tried += 1;
            tracing::debug!(request = label, attempt = tried, "sending request");

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(error) if tried >= self.max_attempts => {
                    tracing::warn!(request = label, attempts = tried, %error, "retry budget exhausted");
                    return Err(RetryExhausted {
                        attempts: tried,
                        last_error: error,
                    });
                }
                Err(error) => {
                    let delay = self.backoff.delay(tried);
                    tracing::warn!(
                        request = label,
                        attempt = tried,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
