//! Exponential backoff with jitter for transient service errors.
//!
//! Attempt `n` (0-based) that fails transiently waits
//! `base_delay * 2^n + uniform(0, max_jitter)` before attempt `n + 1`.
//! No wait follows the final attempt.

use std::time::Duration;

use rand::Rng;

use crate::error::ServiceError;

/// Blocks the calling thread. Replaced by a recorder in tests.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_secs(1),
        }
    }
}

/// The operation never succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure {
    pub attempts: u32,
    pub error: ServiceError,
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Deterministic part of the wait after `attempt` fails.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }

    /// Backoff plus a random jitter in `[0, max_jitter)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.max_jitter.is_zero() {
            Duration::ZERO
        } else {
            let nanos = rand::thread_rng().gen_range(0..self.max_jitter.as_nanos());
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        };
        self.backoff(attempt).saturating_add(jitter)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// On success returns the value and the number of attempts used.
    pub fn run<T>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: impl FnMut() -> Result<T, ServiceError>,
    ) -> Result<(T, u32), RetryFailure> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok((value, attempt + 1)),
                Err(error) if error.is_transient() && attempt + 1 < max_attempts => {
                    let wait = self.delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        wait_ms = wait.as_millis() as u64,
                        error = %error,
                        "transient failure, retrying"
                    );
                    sleeper.sleep(wait);
                    attempt += 1;
                }
                Err(error) => {
                    return Err(RetryFailure {
                        attempts: attempt + 1,
                        error,
                    })
                }
            }
        }
    }
}
