//! Per-identity sliding-window rate limiting.
//!
//! Each client identity (usually an IP address) has an independent,
//! ordered window of admission timestamps. Old timestamps are pruned
//! lazily on access, so a bucket never holds more than the ceiling.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::clock::Clock;

/// Identity used when the caller could not resolve one.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Buckets are swept for idle identities once the map grows past this size.
const MAX_TRACKED_IDENTITIES: usize = 10_000;

/// Rate limiting error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    /// Rate limit exceeded; must wait before sending.
    #[error("rate limit exceeded; retry after {retry_after_secs}s")]
    Exceeded {
        /// Seconds to wait before retry (always at least 1).
        retry_after_secs: u64,
    },
}

/// Sliding-window limiter shared by every request in the process.
pub struct RateLimiter {
    /// Maximum admissions per identity inside the window.
    max_requests: u32,
    /// Window length in milliseconds.
    window_ms: i64,
    /// Admission timestamps (epoch millis) per identity.
    buckets: Mutex<HashMap<String, VecDeque<i64>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter admitting `max_requests` per `window_seconds` per identity.
    pub fn new(max_requests: u32, window_seconds: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window_ms: i64::try_from(window_seconds.saturating_mul(1000)).unwrap_or(i64::MAX),
            buckets: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Admit one request for `identity` or report how long to wait.
    ///
    /// Prune, check and append happen under a single lock so concurrent
    /// callers can neither over-admit nor lose an admission.
    pub fn check(&self, identity: &str) -> Result<(), RateLimitError> {
        let identity = normalize_identity(identity);
        let now = self.clock.now().timestamp_millis();
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        if buckets.len() > MAX_TRACKED_IDENTITIES {
            let horizon = now.saturating_sub(self.window_ms);
            buckets.retain(|_, window| window.back().is_some_and(|last| *last > horizon));
        }

        let window = buckets.entry(identity.to_owned()).or_default();
        prune(window, now, self.window_ms);

        if window.len() >= self.max_requests as usize {
            let oldest = window.front().copied().unwrap_or(now);
            let wait_ms = oldest.saturating_add(self.window_ms).saturating_sub(now);
            let retry_after_secs = u64::try_from(wait_ms.max(0))
                .unwrap_or(0)
                .div_ceil(1000)
                .max(1);
            tracing::debug!(identity, retry_after_secs, "rate limit exceeded");
            return Err(RateLimitError::Exceeded { retry_after_secs });
        }

        window.push_back(now);
        Ok(())
    }

    /// Admissions left for `identity` in the current window.
    pub fn remaining(&self, identity: &str) -> u32 {
        let identity = normalize_identity(identity);
        let now = self.clock.now().timestamp_millis();
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let used = buckets.get_mut(identity).map_or(0, |window| {
            prune(window, now, self.window_ms);
            window.len()
        });
        self.max_requests
            .saturating_sub(u32::try_from(used).unwrap_or(u32::MAX))
    }

    /// Forget every bucket.
    pub fn reset(&self) {
        self.buckets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window_ms", &self.window_ms)
            .finish_non_exhaustive()
    }
}

/// Drop timestamps that are a full window old or older.
fn prune(window: &mut VecDeque<i64>, now: i64, window_ms: i64) {
    let horizon = now.saturating_sub(window_ms);
    while let Some(&first) = window.front() {
        if first <= horizon {
            window.pop_front();
        } else {
            break;
        }
    }
}

fn normalize_identity(identity: &str) -> &str {
    let trimmed = identity.trim();
    if trimmed.is_empty() {
        UNKNOWN_IDENTITY
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::cost::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    fn limiter(max: u32, window_secs: u64) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
        ));
        (RateLimiter::new(max, window_secs, clock.clone()), clock)
    }

    #[test]
    fn allows_within_limit() {
        let (limiter, _) = limiter(5, 3600);
        for _ in 0..5 {
            assert!(limiter.check("10.0.0.1").is_ok());
        }
    }

    #[test]
    fn rejects_the_request_after_the_ceiling() {
        let (limiter, clock) = limiter(30, 3600);
        for _ in 0..30 {
            assert!(limiter.check("10.0.0.1").is_ok());
            clock.advance(Duration::seconds(1));
        }
        match limiter.check("10.0.0.1") {
            Err(RateLimitError::Exceeded { retry_after_secs }) => {
                // Oldest was admitted 30s ago; 3570s remain.
                assert_eq!(retry_after_secs, 3570);
            }
            other => unreachable!("expected rate limit exceeded, got {other:?}"),
        }
    }

    #[test]
    fn retry_after_rounds_up_partial_seconds() {
        let (limiter, clock) = limiter(1, 10);
        limiter.check("a").unwrap();
        clock.advance(Duration::milliseconds(8_500));
        assert_eq!(
            limiter.check("a"),
            Err(RateLimitError::Exceeded {
                retry_after_secs: 2
            })
        );
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let (limiter, clock) = limiter(1, 10);
        limiter.check("a").unwrap();
        clock.advance(Duration::milliseconds(9_999));
        assert_eq!(
            limiter.check("a"),
            Err(RateLimitError::Exceeded {
                retry_after_secs: 1
            })
        );
    }

    #[test]
    fn capacity_returns_after_window_elapses() {
        let (limiter, clock) = limiter(2, 3600);
        limiter.check("a").unwrap();
        clock.advance(Duration::seconds(10));
        limiter.check("a").unwrap();
        assert!(limiter.check("a").is_err());

        // Exactly one window after the oldest admission, one slot frees up.
        clock.advance(Duration::seconds(3590));
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());

        clock.advance(Duration::seconds(10));
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn rejected_requests_are_not_recorded() {
        let (limiter, clock) = limiter(1, 60);
        limiter.check("a").unwrap();
        for _ in 0..5 {
            assert!(limiter.check("a").is_err());
        }
        clock.advance(Duration::seconds(60));
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn identities_are_isolated() {
        let (limiter, _) = limiter(1, 60);
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_err());
        assert!(limiter.check("10.0.0.2").is_ok());
    }

    #[test]
    fn blank_identity_shares_unknown_bucket() {
        let (limiter, _) = limiter(1, 60);
        assert!(limiter.check("").is_ok());
        assert!(limiter.check("   ").is_err());
        assert!(limiter.check(UNKNOWN_IDENTITY).is_err());
    }

    #[test]
    fn remaining_counts_down_and_recovers() {
        let (limiter, clock) = limiter(3, 60);
        assert_eq!(limiter.remaining("a"), 3);
        limiter.check("a").unwrap();
        limiter.check("a").unwrap();
        assert_eq!(limiter.remaining("a"), 1);
        clock.advance(Duration::seconds(61));
        assert_eq!(limiter.remaining("a"), 3);
    }

    #[test]
    fn reset_clears_all_buckets() {
        let (limiter, _) = limiter(1, 60);
        limiter.check("a").unwrap();
        limiter.reset();
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn concurrent_checks_never_over_admit() {
        let (limiter, _) = limiter(50, 3600);
        let limiter = Arc::new(limiter);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..20).filter(|_| limiter.check("shared").is_ok()).count()
                })
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
        assert_eq!(limiter.remaining("shared"), 0);
    }
}
