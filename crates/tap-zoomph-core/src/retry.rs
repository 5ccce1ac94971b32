//! Retry with constant, jittered backoff for API requests

use std::time::Duration;

use rand::Rng;

use crate::http::HttpError;

/// Blocking wait between attempts. Injected so tests can record delays
/// instead of sleeping through them.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] that blocks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fixed-count retry with a constant interval plus random jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Wait between attempts before jitter.
    pub interval: Duration,
    /// Upper bound of the uniform jitter added to `interval`.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(30),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt: `interval + U(0, max_jitter)`,
    /// saturating at `Duration::MAX`.
    pub fn delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = rand::thread_rng().gen_range(0..=jitter_ms);
        self.interval.saturating_add(Duration::from_millis(jitter))
    }
}

/// Retry a fallible request according to `policy`.
///
/// Retryable errors (see [`HttpError::is_retryable`]) are logged, followed
/// by a sleep, up to `policy.max_attempts` attempts in total. A permanent
/// error returns on the first attempt.
///
/// Returns `Ok(T)` on first success, or the final `Err` on exhaustion / non-retryable error.
pub fn retry_with_backoff<T>(
    label: &str,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut attempt_fn: impl FnMut() -> Result<T, HttpError>,
) -> Result<T, HttpError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                let delay = policy.delay();
                log::warn!(
                    "{label}: attempt {attempt}/{max_attempts} failed: {e}, retrying in {delay:?}"
                );
                sleeper.sleep(delay);
                attempt += 1;
            }
            Err(e) => {
                log::error!("{label}: giving up after {attempt} attempt(s): {}", e.body());
                return Err(e);
            }
        }
    }
}
