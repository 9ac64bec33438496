//! Exponential-backoff retry helpers.

use std::fmt::Display;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;

/// Configures how failed operations are retried.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub delay: Duration,
    /// The delay is multiplied by this after each retry.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub const NONE: RetryConfig = RetryConfig {
        max_attempts: 1,
        delay: Duration::ZERO,
        backoff_factor: 1.0,
    };

    pub(crate) fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.delay,
            initial_interval: self.delay,
            randomization_factor: 0.0,
            multiplier: self.backoff_factor,
            max_interval: Duration::from_secs(3600),
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

/// Retries `op` on every error.
pub async fn retry_async<T, E, F, Fut>(config: &RetryConfig, op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_if(config, |_| true, op).await
}

/// Retries `op` while `should_retry` accepts the error. The last error is
/// returned once attempts run out.
pub async fn retry_if<T, E, P, F, Fut>(
    config: &RetryConfig,
    mut should_retry: P,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    P: FnMut(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = config.backoff();
    let mut attempt = 1;
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt >= config.max_attempts || !should_retry(&err) {
            return Err(err);
        }
        let Some(wait) = backoff.next_backoff() else {
            return Err(err);
        };
        warn!(
            "attempt {attempt}/{} failed: {err}, retrying in {wait:?}",
            config.max_attempts
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let start = Instant::now();
        let result = retry_async(&RetryConfig::default(), move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err("flaky")
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s, then 2s.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), String> =
            retry_async(&RetryConfig::default(), move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Err(format!("failure {n}"))
            })
            .await;
        assert_eq!(result.unwrap_err(), "failure 2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_if_stops_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), &str> = retry_if(
            &RetryConfig::default(),
            |err| *err == "transient",
            move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("transient")
                } else {
                    Err("fatal")
                }
            },
        )
        .await;
        assert_eq!(result.unwrap_err(), "fatal");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
