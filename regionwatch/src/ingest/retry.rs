//! Retry policy for storage failures during ingestion.
//!
//! A dropped position report loses a transition forever, so transient store
//! failures and optimistic-commit conflicts are retried a bounded number of
//! times before the pipeline gives up.
//!
//! # Example
//!
//! ```ignore
//! use regionwatch::ingest::RetryPolicy;
//!
//! // Three attempts: immediately, after 100ms, after 200ms
//! let policy = RetryPolicy::exponential(3);
//! assert_eq!(policy.max_attempts(), 3);
//! ```

use std::time::Duration;

/// Default initial delay for exponential backoff (100ms).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 100;

/// Default maximum delay for exponential backoff (5 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 5;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default number of attempts per report (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How the pipeline retries a failed commit.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// Single attempt; any failure surfaces immediately.
    None,

    /// Constant delay between attempts.
    Fixed {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay between attempts.
        delay: Duration,
    },

    /// Delay multiplied after each failure, up to a cap.
    ExponentialBackoff {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay after the first failure.
        initial_delay: Duration,
        /// Delay cap.
        max_delay: Duration,
        /// Multiplier applied after each failure.
        multiplier: f64,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Exponential backoff starting at [`DEFAULT_INITIAL_DELAY_MS`].
    pub fn exponential(max_attempts: u32) -> Self {
        Self::exponential_from(max_attempts, Duration::from_millis(DEFAULT_INITIAL_DELAY_MS))
    }

    /// Exponential backoff with a custom initial delay.
    pub fn exponential_from(max_attempts: u32, initial_delay: Duration) -> Self {
        Self::ExponentialBackoff {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Constant delay between attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Delay before retry number `attempt` (1 is the first retry), or `None`
    /// when the policy allows no further attempts.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed {
                max_attempts,
                delay,
            } => (attempt < *max_attempts).then_some(*delay),
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
                multiplier,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                let delay_ms = initial_delay.as_millis() as f64 * factor;
                let capped = delay_ms.min(max_delay.as_millis() as f64);
                Some(Duration::from_millis(capped as u64))
            }
        }
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fixed { max_attempts, .. } => *max_attempts,
            Self::ExponentialBackoff { max_attempts, .. } => *max_attempts,
        }
    }
}
