// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded retry with exponential backoff for remote calls.
//!
//! A [`RetryPolicy`] wraps one operation closure. Only errors that report
//! themselves as transient (see [`Retryable`]) are retried; everything else
//! is returned on the first attempt. When the attempt ceiling is reached the
//! last error is handed back exactly as the operation produced it.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// Errors that can tell a retry loop whether another attempt may succeed.
pub trait Retryable {
    /// True for connection failures, timeouts and "not ready" conditions.
    fn is_transient(&self) -> bool;

    /// Short, stable class name used in retry logs.
    fn error_class(&self) -> &'static str;
}

/// Per-invocation retry state, handed to the operation on every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryContext {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Total time spent sleeping between attempts so far.
    pub waited: Duration,
    /// Class of the error that triggered the current attempt, if any.
    pub last_error: Option<&'static str>,
}

impl RetryContext {
    fn first() -> Self {
        Self {
            attempt: 1,
            waited: Duration::ZERO,
            last_error: None,
        }
    }

    /// True when this attempt follows a failed one.
    pub fn is_retry(&self) -> bool {
        self.attempt > 1
    }
}

/// Bounded-attempt exponential-backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// Attempt ceiling shared by every admin operation.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Create a policy with the default attempt ceiling.
    pub fn new(initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
        }
    }

    /// Policy for mutating calls (create, alter, delete): 4s doubling to 10s.
    pub fn mutation() -> Self {
        Self::new(Duration::from_secs(4), Duration::from_secs(10))
    }

    /// Policy for read-only calls (list, describe, get): 2s doubling to 8s.
    pub fn query() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(8))
    }

    /// Same attempt ceiling, no sleeping between attempts.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Override the attempt ceiling (at least one attempt is always made).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Maximum number of attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// `initial * 2^(attempt - 1)`, capped at the ceiling.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(multiplier)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempt ceiling is reached.
    pub fn run<T, E, F>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + fmt::Display,
        F: FnMut(&RetryContext) -> Result<T, E>,
    {
        let mut ctx = RetryContext::first();

        loop {
            match op(&ctx) {
                Ok(value) => {
                    if ctx.is_retry() {
                        debug!(
                            operation,
                            attempt = ctx.attempt,
                            waited_ms = ctx.waited.as_millis() as u64,
                            "operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    if ctx.attempt >= self.max_attempts {
                        warn!(
                            operation,
                            attempts = ctx.attempt,
                            waited_ms = ctx.waited.as_millis() as u64,
                            error_class = err.error_class(),
                            error = %err,
                            "retry attempts exhausted"
                        );
                        return Err(err);
                    }

                    let delay = self.backoff_for(ctx.attempt);
                    warn!(
                        operation,
                        attempt = ctx.attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error_class = err.error_class(),
                        error = %err,
                        "transient failure, retrying"
                    );

                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    ctx.attempt += 1;
                    ctx.waited += delay;
                    ctx.last_error = Some(err.error_class());
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum FakeError {
        Timeout(u32),
        Invalid,
    }

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                FakeError::Timeout(n) => write!(f, "timed out (#{})", n),
                FakeError::Invalid => write!(f, "invalid request"),
            }
        }
    }

    impl Retryable for FakeError {
        fn is_transient(&self) -> bool {
            matches!(self, FakeError::Timeout(_))
        }

        fn error_class(&self) -> &'static str {
            match self {
                FakeError::Timeout(_) => "timeout",
                FakeError::Invalid => "invalid",
            }
        }
    }

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let policy = RetryPolicy::mutation();
        assert_eq!(policy.backoff_for(1), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(8));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(10));
        assert_eq!(policy.backoff_for(40), Duration::from_secs(10));

        let query = RetryPolicy::query();
        assert_eq!(query.backoff_for(1), Duration::from_secs(2));
        assert_eq!(query.backoff_for(2), Duration::from_secs(4));
        assert_eq!(query.backoff_for(3), Duration::from_secs(8));
    }

    #[test]
    fn ceiling_never_below_floor() {
        let policy = RetryPolicy::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(5));
    }

    #[test]
    fn succeeds_without_retry() {
        let mut calls = 0;
        let result: Result<u32, FakeError> = RetryPolicy::immediate().run("op", |_| {
            calls += 1;
            Ok(7)
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn recovers_after_transient_failure() {
        let mut seen = Vec::new();
        let result = RetryPolicy::immediate().run("op", |ctx| {
            seen.push((ctx.attempt, ctx.last_error));
            if ctx.attempt < 3 {
                Err(FakeError::Timeout(ctx.attempt))
            } else {
                Ok("done")
            }
        });
        assert_eq!(result, Ok("done"));
        assert_eq!(
            seen,
            vec![(1, None), (2, Some("timeout")), (3, Some("timeout"))]
        );
    }

    #[test]
    fn exhausted_retries_return_last_error_unchanged() {
        let mut calls = 0;
        let result: Result<(), FakeError> = RetryPolicy::immediate().run("op", |ctx| {
            calls += 1;
            Err(FakeError::Timeout(ctx.attempt))
        });
        assert_eq!(calls, 3);
        assert_eq!(result, Err(FakeError::Timeout(3)));
    }

    #[test]
    fn non_transient_error_is_not_retried() {
        let mut calls = 0;
        let result: Result<(), FakeError> = RetryPolicy::immediate().run("op", |_| {
            calls += 1;
            Err(FakeError::Invalid)
        });
        assert_eq!(calls, 1);
        assert_eq!(result, Err(FakeError::Invalid));
    }

    #[test]
    fn custom_attempt_ceiling() {
        let mut calls = 0;
        let _ = RetryPolicy::immediate()
            .with_max_attempts(5)
            .run("op", |ctx| -> Result<(), FakeError> {
                calls += 1;
                Err(FakeError::Timeout(ctx.attempt))
            });
        assert_eq!(calls, 5);

        assert_eq!(RetryPolicy::immediate().with_max_attempts(0).max_attempts(), 1);
    }

    #[test]
    fn waited_time_accumulates() {
        let policy = RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(2));
        let mut last_wait = Duration::ZERO;
        let _: Result<(), FakeError> = policy.run("op", |ctx| {
            last_wait = ctx.waited;
            Err(FakeError::Timeout(ctx.attempt))
        });
        assert_eq!(last_wait, Duration::from_millis(3));
    }
}
