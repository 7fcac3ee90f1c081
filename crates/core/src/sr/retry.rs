//! Exponential backoff with jitter (spec.md §4.3, §7 "`WorkerUnavailable`
//! is transient; C3 retries this with exponential backoff").

use crate::error::{InMapError, Result};
use rand::Rng;
use std::time::Duration;

/// An iterator of delays: `base * 2^attempt`, capped at `max`, each
/// jittered by up to ±25% so a burst of retrying jobs doesn't resynchronize
/// into a thundering herd.
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Backoff { base, max, attempt: 0 }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let multiplier = 1u64.checked_shl(self.attempt).unwrap_or(u64::MAX);
        let nominal = self.base.saturating_mul(multiplier.min(u32::MAX as u64) as u32).min(self.max);
        self.attempt = self.attempt.saturating_add(1);

        let mut rng = rand::rng();
        let jitter_frac: f64 = rng.random_range(-0.25..=0.25);
        let jittered_nanos = (nominal.as_nanos() as f64 * (1.0 + jitter_frac)).max(0.0);
        Some(Duration::from_nanos(jittered_nanos as u64))
    }
}

/// Run `submit` up to `max_attempts` times, retrying only
/// `InMapError::is_transient` failures with a `Backoff`-derived delay
/// (actually sleeping is left to the async caller; this returns the delay
/// instead of blocking so callers can choose how to wait).
pub fn retry_transient<T>(
    max_attempts: usize,
    backoff: &mut Backoff,
    mut attempt_fn: impl FnMut() -> Result<T>,
    mut on_retry: impl FnMut(Duration),
) -> Result<T> {
    let mut last_err: Option<InMapError> = None;
    for _ in 0..max_attempts.max(1) {
        match attempt_fn() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                if let Some(delay) = backoff.next() {
                    on_retry(delay);
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or(InMapError::Cancelled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_respects_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(10), Duration::from_millis(100));
        let delays: Vec<Duration> = (0..6).map(|_| backoff.next().unwrap()).collect();
        for d in &delays {
            assert!(*d <= Duration::from_millis(125)); // cap + max jitter
        }
        // Later delays should, on average, not be smaller than early ones
        // despite jitter (nominal value is monotonically non-decreasing).
        assert!(delays[5] > Duration::from_millis(0));
    }

    #[test]
    fn retry_transient_gives_up_after_max_attempts() {
        let mut backoff = Backoff::new(Duration::from_millis(1), Duration::from_millis(5));
        let mut attempts = 0;
        let result: Result<()> = retry_transient(
            3,
            &mut backoff,
            || {
                attempts += 1;
                Err(InMapError::WorkerUnavailable {
                    job: "j".to_string(),
                    reason: "down".to_string(),
                })
            },
            |_| {},
        );
        assert!(result.is_err());
        assert_eq!(attempts, 3);
    }

    #[test]
    fn retry_transient_does_not_retry_non_transient_errors() {
        let mut backoff = Backoff::new(Duration::from_millis(1), Duration::from_millis(5));
        let mut attempts = 0;
        let result: Result<()> = retry_transient(
            3,
            &mut backoff,
            || {
                attempts += 1;
                Err(InMapError::Cancelled)
            },
            |_| {},
        );
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
