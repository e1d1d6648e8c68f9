//! Retry with exponential backoff
//!
//! Attempts run strictly one after another. Each attempt emits exactly one log event
//! carrying `operation`, `attempt` and `max_attempts`, so a run's history can be read (and
//! counted) from the logs.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for a single backoff delay
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Factor applied to the delay after each further failure
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Default::default()
        }
    }

    /// Delay to wait after `attempt` (1-based) failed: `base * multiplier^(attempt - 1)`,
    /// capped at [`MAX_BACKOFF`].
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.checked_pow(exponent).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: E },

    /// An attempt failed with an error that retrying cannot fix
    #[error("attempt {attempt} failed with a non-retryable error: {error}")]
    Aborted { attempt: u32, error: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Aborted { attempt, .. } => *attempt,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last_error, .. } => last_error,
            RetryError::Aborted { error, .. } => error,
        }
    }
}

/// Run `f` until it succeeds, fails with an error `is_retryable` rejects, or the policy's
/// attempts are used up. `f` receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    operation: &str,
    is_retryable: R,
    mut f: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f(attempt).await {
            Ok(value) => {
                tracing::info!(
                    operation = %operation,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    "Attempt succeeded"
                );
                return Ok(value);
            }
            Err(error) if !is_retryable(&error) => {
                tracing::warn!(
                    operation = %operation,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %error,
                    "Attempt failed with non-retryable error"
                );
                return Err(RetryError::Aborted { attempt, error });
            }
            Err(error) if attempt >= max_attempts => {
                tracing::error!(
                    operation = %operation,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %error,
                    "Attempt failed; no attempts left"
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }
            Err(error) => {
                let delay = policy.delay_after_attempt(attempt);
                tracing::warn!(
                    operation = %operation,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Attempt failed; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Counts events that carry an `attempt` field.
    #[derive(Clone, Default)]
    struct AttemptCounter(Arc<AtomicUsize>);

    struct HasAttempt(bool);

    impl Visit for HasAttempt {
        fn record_debug(&mut self, field: &Field, _value: &dyn std::fmt::Debug) {
            if field.name() == "attempt" {
                self.0 = true;
            }
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for AttemptCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = HasAttempt(false);
            event.record(&mut visitor);
            if visitor.0 {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn failing_until(
        successful_attempt: u32,
    ) -> impl FnMut(u32) -> std::future::Ready<Result<u32, String>> {
        move |attempt| {
            std::future::ready(if attempt >= successful_attempt {
                Ok(attempt)
            } else {
                Err(format!("attempt {} failed", attempt))
            })
        }
    }

    #[test]
    fn delays_double_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after_attempt(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after_attempt(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after_attempt(40), MAX_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_three_seconds() {
        let counter = AttemptCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let start = tokio::time::Instant::now();
        let result =
            retry_with_backoff(&RetryPolicy::default(), "upload", |_| true, failing_until(3)).await;

        assert_eq!(result.unwrap(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(3100), "elapsed {:?}", elapsed);
        assert_eq!(counter.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts() {
        let counter = AttemptCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let result: Result<(), _> =
            retry_with_backoff(&RetryPolicy::default(), "upload", |_| true, |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("service unavailable".to_string()) }
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
        assert_eq!(err.into_inner(), "service unavailable");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(counter.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_stops_immediately() {
        let start = tokio::time::Instant::now();
        let result = retry_with_backoff(
            &RetryPolicy::default(),
            "upload",
            |e: &String| !e.contains("forbidden"),
            |_| async { Err::<(), _>("forbidden".to_string()) },
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, RetryError::Aborted { attempt: 1, .. }));
        assert_eq!(err.attempts(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        let result = retry_with_backoff(&policy, "upload", |_| true, failing_until(1)).await;
        assert_eq!(result.unwrap(), 1);
    }
}
