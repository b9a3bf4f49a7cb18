#![deny(missing_docs)]
//! Bounded exponential backoff for transient generative-backend errors.

use rand::Rng;
use scout_errors::{categorize, ScoutError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff parameters for [`with_retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay, in seconds, for the exponential backoff.
    pub base_delay_secs: f64,
    /// Maximum delay, in seconds, a single wait will ever reach.
    pub max_delay_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 3, base_delay_secs: 1.0, max_delay_secs: 30.0 }
    }
}

/// Run `op` up to `policy.max_attempts` times.
///
/// On failure, if [`scout_errors::categorize`] marks the error retryable,
/// waits `min(max_delay, base_delay * 2^attempt) + jitter` before trying
/// again; otherwise the error is returned immediately without consuming a
/// remaining attempt.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, mut op: F) -> Result<T, ScoutError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScoutError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let category = categorize(&err);
                let exhausted = attempt + 1 >= policy.max_attempts;
                if !category.is_retryable() || exhausted {
                    return Err(err);
                }

                let delay = backoff_delay(policy, attempt);
                warn!(attempt, category = %category, delay_secs = delay.as_secs_f64(), "with_retry: retrying after transient failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

fn backoff_delay(policy: RetryPolicy, attempt: u32) -> Duration {
    let exp = policy.base_delay_secs * 2f64.powi(attempt as i32);
    let capped = exp.min(policy.max_delay_secs);
    let jitter = rand::thread_rng().gen_range(0.0..=capped * 0.1);
    Duration::from_secs_f64(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy { max_attempts: 3, base_delay_secs: 0.001, max_delay_secs: 0.01 }
    }

    #[tokio::test]
    async fn succeeds_without_retrying_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let result: Result<i32, ScoutError> = with_retry(fast_policy(), move || {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_a_retryable_error_until_it_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let result: Result<i32, ScoutError> = with_retry(fast_policy(), move || {
            let calls = calls2.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ScoutError::NetworkError("transient".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_retryable_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let result: Result<i32, ScoutError> = with_retry(fast_policy(), move || {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ScoutError::PermissionDenied("nope".into()))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let policy = RetryPolicy { max_attempts: 2, ..fast_policy() };
        let result: Result<i32, ScoutError> = with_retry(policy, move || {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ScoutError::NetworkError("still down".into()))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_delay_is_capped_at_max_delay() {
        let policy = RetryPolicy { max_attempts: 10, base_delay_secs: 1.0, max_delay_secs: 5.0 };
        let delay = backoff_delay(policy, 10);
        assert!(delay.as_secs_f64() <= 5.5);
    }
}
