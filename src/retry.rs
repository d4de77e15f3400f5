//! Retry engine with capped exponential backoff and jitter.
//!
//! [`Retryer::execute`] drives a caller-supplied async operation according
//! to a [`RetryPolicy`], using the error taxonomy to decide whether a
//! failure is worth re-attempting. Attempts run strictly sequentially; the
//! only suspension point is the backoff wait between attempts, which races
//! against the caller's cancellation token.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::error::{Error, Result};

/// Drives repeated invocation of an operation under a retry policy.
#[derive(Debug, Clone)]
pub struct Retryer {
    policy: RetryPolicy,
}

impl Retryer {
    /// Create a retryer for the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The policy this retryer runs under.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `operation` with retries.
    ///
    /// Attempts are indexed `0..=max_retries`. Success returns immediately.
    /// A non-retryable failure returns immediately with no wait. On the
    /// last allowed attempt the failure is returned as-is. Between attempts
    /// the engine suspends for the computed backoff, racing it against
    /// `cancel`; if cancellation wins, a `Cancelled`-kind error supersedes
    /// the pending operation error.
    pub async fn execute<T, F, Fut>(&self, cancel: &CancellationToken, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_retries = self.policy.max_retries();

        for attempt in 0..=max_retries {
            let err = match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(attempts = attempt + 1, "operation succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!(error = %err, "error is not retryable, stopping");
                return Err(err);
            }

            if attempt == max_retries {
                warn!(attempts = attempt + 1, error = %err, "max retries reached");
                return Err(err);
            }

            let backoff = self.backoff_delay(attempt, &err);
            warn!(
                attempt = attempt + 1,
                max_retries,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "operation failed, retrying"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::cancelled()),
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        unreachable!("retry loop returns on success, terminal error, or exhaustion")
    }

    /// Compute the wait before the attempt following 0-based `attempt`.
    ///
    /// A retry-after hint on the error wins verbatim. Otherwise the delay
    /// grows as `initial * multiplier^attempt`, capped at `max_backoff`,
    /// with a symmetric +/-25% jitter drawn after the cap (so the final
    /// delay may exceed the cap by up to 25%).
    pub fn backoff_delay(&self, attempt: u32, err: &Error) -> Duration {
        if let Some(retry_after) = err.retry_after() {
            return retry_after;
        }

        let raw = self.policy.initial_backoff().as_secs_f64()
            * self.policy.multiplier().powi(attempt as i32);
        let capped = raw.min(self.policy.max_backoff().as_secs_f64());

        // Uniform draw from [0.75 * capped, 1.25 * capped].
        let jittered = capped * rand::thread_rng().gen_range(0.75..=1.25);

        Duration::from_secs_f64(jittered)
    }
}
