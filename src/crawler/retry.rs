//! Bounded retry with backoff
//!
//! Failures right after a navigation tend to clear up quickly, sustained ones
//! do not: the first `short_delay_threshold` retries wait `short_delay`, every
//! later retry waits `long_delay`.

use crate::{StepError, StepResult};
use futures::future::LocalBoxFuture;
use std::time::Duration;
use thiserror::Error;

/// A retry budget ran out
#[derive(Debug, Error)]
#[error("{step} failed after {attempts} attempts ({} error): {last_error}", .last_error.category())]
pub struct ExhaustedError {
    pub step: String,
    pub attempts: u32,
    #[source]
    pub last_error: StepError,
}

/// Retry parameters for one kind of step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempt_budget: u32,
    short_delay: Duration,
    long_delay: Duration,
    short_delay_threshold: u32,
}

impl RetryPolicy {
    pub fn new(
        attempt_budget: u32,
        short_delay: Duration,
        long_delay: Duration,
        short_delay_threshold: u32,
    ) -> Self {
        Self {
            attempt_budget: attempt_budget.max(1),
            short_delay,
            long_delay,
            short_delay_threshold,
        }
    }

    /// Same delay before every retry
    pub fn fixed(attempt_budget: u32, delay: Duration) -> Self {
        Self::new(attempt_budget, delay, delay, u32::MAX)
    }

    pub fn attempt_budget(&self) -> u32 {
        self.attempt_budget
    }

    /// Delay before the `retry`-th retry (1-based)
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        if retry <= self.short_delay_threshold {
            self.short_delay
        } else {
            self.long_delay
        }
    }

    /// Runs `op` until it succeeds or the budget is spent
    ///
    /// Between attempts, `on_failure` runs first (it cannot fail; recovery
    /// errors are its own business) and then the backoff delay elapses.
    /// `ctx` is handed to both closures so they can share mutable state
    /// without capturing it.
    ///
    /// # Errors
    ///
    /// Returns `ExhaustedError` carrying the last failure once `op` has
    /// failed `attempt_budget` times.
    pub async fn execute<C, T, F, H>(
        &self,
        step: &str,
        ctx: &mut C,
        mut op: F,
        mut on_failure: H,
    ) -> Result<T, ExhaustedError>
    where
        F: for<'a> FnMut(&'a mut C) -> LocalBoxFuture<'a, StepResult<T>>,
        H: for<'a> FnMut(&'a mut C) -> LocalBoxFuture<'a, ()>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match op(ctx).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            tracing::warn!(
                "{} failed (attempt {}/{}, {}): {}",
                step,
                attempt,
                self.attempt_budget,
                error.category(),
                error
            );

            if attempt >= self.attempt_budget {
                return Err(ExhaustedError {
                    step: step.to_string(),
                    attempts: attempt,
                    last_error: error,
                });
            }

            on_failure(ctx).await;
            tokio::time::sleep(self.delay_before_retry(attempt)).await;
        }
    }
}

/// Recovery hook that does nothing
pub fn no_recovery<C>(_: &mut C) -> LocalBoxFuture<'_, ()> {
    Box::pin(async {})
}
