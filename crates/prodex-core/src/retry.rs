use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Retry, backoff, and timeout policy for one I/O boundary of the pipeline.
///
/// Delay before attempt `n + 1` is `initial_backoff * 2^(n - 1)`, capped at
/// `max_backoff`. Only errors reporting [`AppError::is_retryable`] are retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Values below 1 act as 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Upper bound for a single attempt. `None` leaves it to the transport.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    /// A policy making exactly one attempt bounded by `timeout`.
    pub fn single_attempt(timeout: Duration) -> Self {
        Self {
            attempt_timeout: Some(timeout),
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Delay to wait after the given failed attempt (1-indexed).
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        std::cmp::min(self.initial_backoff.saturating_mul(factor), self.max_backoff)
    }

    /// Run `operation` under this policy.
    ///
    /// `on_timeout` builds the stage-specific error reported when an attempt
    /// exceeds `attempt_timeout`; such errors go through the same retry check
    /// as any other.
    pub async fn run<T, Op, Fut, TimeoutErr>(
        &self,
        mut operation: Op,
        on_timeout: TimeoutErr,
    ) -> Result<T, AppError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
        TimeoutErr: Fn(Duration) -> AppError,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = match self.attempt_timeout {
                Some(limit) => tokio::time::timeout(limit, operation())
                    .await
                    .unwrap_or_else(|_| Err(on_timeout(limit))),
                None => operation().await,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && err.is_retryable() => {
                    let delay = self.delay_after_attempt(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
