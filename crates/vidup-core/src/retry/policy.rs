use rand::Rng;
use std::time::Duration;

/// Upper bound on a single backoff sleep, whatever the configured unit.
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure with no status code (timeout, reset, DNS).
    RetriableTransport,
    /// Transient server fault (500, 502, 503, 504).
    RetriableServer(u16),
    /// Permanent failure; never retried.
    Fatal,
}

impl ErrorKind {
    pub fn is_retriable(self) -> bool {
        !matches!(self, ErrorKind::Fatal)
    }
}

/// Decision returned by the backoff scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry: the error is fatal.
    NoRetry,
    /// The retry ceiling was exceeded.
    Exhausted,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Randomized exponential backoff: `uniform(0, 1) * 2^retry` units.
///
/// Pure: never sleeps. The caller owns the retry counter and the sleep.
#[derive(Debug, Clone, Copy)]
pub struct BackoffScheduler {
    /// Highest retry number that is still attempted.
    pub max_retries: u32,
    /// Length of one backoff unit (one second in production).
    pub unit: Duration,
}

impl Default for BackoffScheduler {
    fn default() -> Self {
        Self {
            max_retries: 10,
            unit: Duration::from_secs(1),
        }
    }
}

impl BackoffScheduler {
    pub fn new(max_retries: u32, unit: Duration) -> Self {
        Self { max_retries, unit }
    }

    /// True once `retry` is past the ceiling.
    pub fn is_exhausted(&self, retry: u32) -> bool {
        retry > self.max_retries
    }

    /// Delay before retry number `retry` (1-based), using the thread RNG.
    pub fn next_delay(&self, retry: u32) -> Duration {
        self.next_delay_with(retry, &mut rand::thread_rng())
    }

    /// Delay before retry number `retry`, drawing jitter from `rng`.
    /// Always within `[0, 2^retry)` units and never above `MAX_DELAY`.
    pub fn next_delay_with<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let max_sleep = 2f64.powi(retry.min(30) as i32);
        let factor: f64 = rng.gen::<f64>();
        let secs = self.unit.as_secs_f64() * factor * max_sleep;
        Duration::try_from_secs_f64(secs).map_or(MAX_DELAY, |d| d.min(MAX_DELAY))
    }

    /// Full decision for a failure of the given kind at retry number `retry`
    /// (the counter value after incrementing for this failure).
    pub fn decide(&self, retry: u32, kind: ErrorKind) -> RetryDecision {
        if !kind.is_retriable() {
            return RetryDecision::NoRetry;
        }
        if self.is_exhausted(retry) {
            return RetryDecision::Exhausted;
        }
        RetryDecision::RetryAfter(self.next_delay(retry))
    }
}
