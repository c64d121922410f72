//! Retry Classifier: maps a failure to an [`ErrorKind`], decides whether a
//! fetch is worth retrying, and computes the backoff delay before the next
//! attempt.
//!
//! Generalizes the fetcher's old fixed exponential-backoff policy into a
//! table keyed by error kind, since a timeout and a parse failure should
//! never be retried the same way.

use std::time::Duration;

/// Coarse classification of why a fetch attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Timeout,
    AntiBot,
    Parse,
    Storage,
    Config,
    Concurrency,
    Other,
}

impl ErrorKind {
    /// Base delay before the first retry, before backoff is applied.
    fn base_delay(&self) -> Duration {
        match self {
            ErrorKind::Network => Duration::from_secs(2),
            ErrorKind::Timeout => Duration::from_secs(5),
            ErrorKind::AntiBot => Duration::from_secs(10),
            ErrorKind::Concurrency => Duration::from_secs(1),
            ErrorKind::Parse | ErrorKind::Storage | ErrorKind::Other => Duration::from_secs(3),
            ErrorKind::Config => Duration::ZERO,
        }
    }

    /// Whether this kind of failure is ever worth retrying on its own,
    /// ignoring the `Concurrency`-wraps-`Config` exception handled by
    /// [`RetryClassifier::should_retry`].
    fn retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::AntiBot | ErrorKind::Concurrency
        )
    }
}

const MAX_DELAY: Duration = Duration::from_secs(60);
const BACKOFF_MULTIPLIER: f64 = 1.5;

/// Stateless policy deciding retry eligibility and delay for a failed fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryClassifier;

impl RetryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Whether a request that failed with `kind` on attempt number `attempt`
    /// (0-indexed) should be retried at all. `wraps_config_error` marks a
    /// `Concurrency` failure that was actually caused by a config problem
    /// (e.g. a semaphore that will never free because of a bad pool size) --
    /// those must not retry even though `Concurrency` is normally retryable.
    pub fn should_retry(&self, kind: ErrorKind, attempt: u32, max_retries: u32, wraps_config_error: bool) -> bool {
        if attempt >= max_retries {
            return false;
        }
        if kind == ErrorKind::Concurrency && wraps_config_error {
            return false;
        }
        kind.retryable()
    }

    /// Delay before the next attempt: `min(60s, base * 1.5^attempt)`, unless
    /// the server supplied a `Retry-After` value, which always wins.
    pub fn delay_for(&self, kind: ErrorKind, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(retry_after) = retry_after {
            return retry_after.min(MAX_DELAY);
        }

        let base = kind.base_delay();
        let scaled = base.as_secs_f64() * BACKOFF_MULTIPLIER.powi(attempt as i32);
        Duration::from_secs_f64(scaled.min(MAX_DELAY.as_secs_f64()))
    }
}

/// Parses a `Retry-After` header value, which is either a delay in seconds
/// or an HTTP-date. Only the seconds form is supported; an HTTP-date is
/// treated as absent rather than guessed at.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_timeout_and_antibot_are_retryable() {
        let rc = RetryClassifier::new();
        assert!(rc.should_retry(ErrorKind::Network, 0, 3, false));
        assert!(rc.should_retry(ErrorKind::Timeout, 0, 3, false));
        assert!(rc.should_retry(ErrorKind::AntiBot, 0, 3, false));
    }

    #[test]
    fn parse_storage_config_other_are_not_retryable() {
        let rc = RetryClassifier::new();
        assert!(!rc.should_retry(ErrorKind::Parse, 0, 3, false));
        assert!(!rc.should_retry(ErrorKind::Storage, 0, 3, false));
        assert!(!rc.should_retry(ErrorKind::Config, 0, 3, false));
        assert!(!rc.should_retry(ErrorKind::Other, 0, 3, false));
    }

    #[test]
    fn concurrency_retries_unless_it_wraps_a_config_error() {
        let rc = RetryClassifier::new();
        assert!(rc.should_retry(ErrorKind::Concurrency, 0, 3, false));
        assert!(!rc.should_retry(ErrorKind::Concurrency, 0, 3, true));
    }

    #[test]
    fn stops_once_max_retries_reached() {
        let rc = RetryClassifier::new();
        assert!(!rc.should_retry(ErrorKind::Network, 3, 3, false));
        assert!(!rc.should_retry(ErrorKind::Network, 4, 3, false));
    }

    #[test]
    fn delay_grows_with_backoff_multiplier() {
        let rc = RetryClassifier::new();
        let d0 = rc.delay_for(ErrorKind::Network, 0, None);
        let d1 = rc.delay_for(ErrorKind::Network, 1, None);
        let d2 = rc.delay_for(ErrorKind::Network, 2, None);
        assert_eq!(d0, Duration::from_secs(2));
        assert_eq!(d1, Duration::from_secs_f64(3.0));
        assert_eq!(d2, Duration::from_secs_f64(4.5));
    }

    #[test]
    fn delay_is_capped_at_sixty_seconds() {
        let rc = RetryClassifier::new();
        let delay = rc.delay_for(ErrorKind::AntiBot, 10, None);
        assert_eq!(delay, MAX_DELAY);
    }

    #[test]
    fn retry_after_header_overrides_computed_delay() {
        let rc = RetryClassifier::new();
        let delay = rc.delay_for(ErrorKind::Network, 0, Some(Duration::from_secs(120)));
        assert_eq!(delay, MAX_DELAY);
        let delay = rc.delay_for(ErrorKind::Network, 0, Some(Duration::from_secs(30)));
        assert_eq!(delay, Duration::from_secs(30));
    }

    #[test]
    fn parses_seconds_form_retry_after() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_http_date_retry_after() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2026 07:28:00 GMT"), None);
    }
}
