//! Retry policy for fragment fetches.
//!
//! The schedule is linear: after the Nth failed attempt the loop waits
//! `backoff * N` before trying again. Every transport failure is retried the
//! same way; there is no status-code special-casing.

use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;

use super::error::FetchError;

/// Configuration for the retry loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt; `max_retries + 1` attempts in total.
    pub max_retries: u32,
    /// Base delay, scaled linearly by the attempt number.
    pub backoff: Duration,
    /// Randomize each delay by a 0.5..=1.5 factor.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(1000),
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
            jitter: false,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay to wait after `attempt` (1-based) has failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.backoff.saturating_mul(attempt);
        if self.jitter {
            let factor = rand::thread_rng().gen_range(0.5..=1.5);
            Duration::from_millis((base.as_millis() as f64 * factor) as u64)
        } else {
            base
        }
    }
}

/// Executes an operation with the configured retry schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds or the attempt budget is exhausted,
    /// returning the last error in the terminal case.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let attempts = self.config.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("fetch succeeded on attempt {attempt}/{attempts}");
                    }
                    return Ok(value);
                }
                Err(error) if attempt < attempts => {
                    warn!("fetch attempt {attempt}/{attempts} failed: {error}");
                    let delay = self.config.delay_for(attempt);
                    debug!("waiting {delay:?} before retry");
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    warn!("fetch attempt {attempt}/{attempts} failed, giving up: {error}");
                    return Err(error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            backoff: Duration::from_millis(1),
            jitter: false,
        }
    }

    #[test]
    fn delay_grows_linearly() {
        let config = RetryConfig {
            max_retries: 3,
            backoff: Duration::from_millis(100),
            jitter: false,
        };

        assert_eq!(config.delay_for(1), Duration::from_millis(100));
        assert_eq!(config.delay_for(2), Duration::from_millis(200));
        assert_eq!(config.delay_for(3), Duration::from_millis(300));
    }

    #[test]
    fn jittered_delay_stays_in_range() {
        let config = RetryConfig {
            max_retries: 1,
            backoff: Duration::from_millis(100),
            jitter: true,
        };

        for _ in 0..20 {
            let delay = config.delay_for(2);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[test]
    fn attempt_budget_counts_the_first_try() {
        assert_eq!(fast_config(0).max_attempts(), 1);
        assert_eq!(fast_config(3).max_attempts(), 4);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(fast_config(3));
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(FetchError::Status {
                            source_path: "components/a.html".to_string(),
                            status: 500,
                        })
                    } else {
                        Ok("body")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "body");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_exactly_max_attempts() {
        let policy = RetryPolicy::new(fast_config(2));
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), FetchError> = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FetchError::Network {
                        source_path: "components/a.html".to_string(),
                        message: "connection refused".to_string(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
