//! Retry policy: decides backoff delays.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with a cap and jitter.
///
/// `delay(attempt) = min(cap, base * 2^(attempt - 1)) + jitter`, where
/// `attempt` is the post-increment attempt count (the first retry after an
/// initial failure uses attempt 1 and waits roughly `base`). Jitter is a
/// uniform draw from `[0, jitter)` so co-queued actions and co-located
/// clients do not retry in lockstep.
///
/// The cap keeps long-failing actions visible and retryable indefinitely
/// instead of starving them; only an explicit user discard removes them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            cap: Duration::from_millis(300_000),
            jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Same policy without the random component, for deterministic tests.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = Duration::ZERO;
        self
    }

    /// Delay before the next retry, given the attempt count after the
    /// failure was recorded.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        // Clamp the exponent: 2^63 already dwarfs any sane cap.
        let exponent = attempt.saturating_sub(1).min(63);
        let doubled = self.base.as_secs_f64() * 2f64.powi(exponent as i32);
        let capped = doubled.min(self.cap.as_secs_f64());

        let jitter = if self.jitter.is_zero() {
            0.0
        } else {
            rand::thread_rng().gen_range(0.0..self.jitter.as_secs_f64())
        };

        Duration::from_secs_f64(capped + jitter)
    }
}
