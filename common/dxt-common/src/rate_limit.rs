//! Per-client sliding window rate limiting
//!
//! Each client identifier owns a window of request timestamps (milliseconds
//! since the Unix epoch). On every check the window is purged of entries that
//! fell out of the trailing interval, then compared against the quota. A
//! rejected request leaves the window untouched.
//!
//! # Memory
//!
//! Windows are purged lazily, on their owner's next check. To keep the client
//! map from growing with every identifier ever seen, every
//! `cleanup_interval` checks the limiter also drops clients whose windows
//! have fully expired. An expired window and an absent one are
//! indistinguishable to [`RateLimiter::check`], so this never changes an
//! accept/reject outcome.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

/// Configuration for the rate limiter
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum number of requests allowed in the window
    pub quota: u32,
    /// Length of the sliding window in milliseconds
    pub window_ms: u64,
    /// Drop expired client windows every N checks
    pub cleanup_interval: u64,
}

impl RateLimitConfig {
    /// Quota per minute, the shape every extension configures
    pub fn per_minute(quota: u32) -> Self {
        Self {
            quota,
            ..Self::default()
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            quota: 60,
            window_ms: 60_000,
            cleanup_interval: 100,
        }
    }
}

/// Returned when a client has used up its quota for the current window
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Rate limit exceeded ({quota} requests per {window_ms} ms)")]
pub struct RateLimitExceeded {
    pub quota: u32,
    pub window_ms: u64,
}

/// Sliding window request counter keyed by client identifier
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, VecDeque<i64>>>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    /// Check a request from `client_id` at the current wall-clock time
    pub fn check_now(&self, client_id: &str) -> Result<(), RateLimitExceeded> {
        self.check(client_id, Utc::now().timestamp_millis())
    }

    /// Check a request from `client_id` at `now_ms`
    ///
    /// On success the request is recorded in the client's window. On failure
    /// nothing is recorded.
    pub fn check(&self, client_id: &str, now_ms: i64) -> Result<(), RateLimitExceeded> {
        let count = self.checks.fetch_add(1, Ordering::Relaxed);
        let mut windows = self.lock();

        if count > 0 && count % self.config.cleanup_interval.max(1) == 0 {
            let before = windows.len();
            Self::prune_locked(&mut windows, self.cutoff(now_ms));
            tracing::debug!(
                dropped = before - windows.len(),
                "pruned expired rate limit windows"
            );
        }

        let cutoff = self.cutoff(now_ms);
        let window = windows.entry(client_id.to_string()).or_default();
        window.retain(|&t| t > cutoff);

        if window.len() >= self.config.quota as usize {
            tracing::warn!(
                requests = window.len(),
                quota = self.config.quota,
                "rate limit exceeded"
            );
            return Err(RateLimitExceeded {
                quota: self.config.quota,
                window_ms: self.config.window_ms,
            });
        }

        window.push_back(now_ms);
        Ok(())
    }

    /// Number of requests currently recorded for `client_id`
    ///
    /// Reports the stored window as-is, without purging.
    pub fn window_len(&self, client_id: &str) -> usize {
        self.lock().get(client_id).map_or(0, VecDeque::len)
    }

    /// Number of clients with a stored window
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Drop every client whose window holds no request newer than the window
    pub fn prune(&self, now_ms: i64) {
        let cutoff = self.cutoff(now_ms);
        Self::prune_locked(&mut self.lock(), cutoff);
    }

    fn prune_locked(windows: &mut HashMap<String, VecDeque<i64>>, cutoff: i64) {
        windows.retain(|_, window| window.iter().any(|&t| t > cutoff));
    }

    fn cutoff(&self, now_ms: i64) -> i64 {
        let window = i64::try_from(self.config.window_ms).unwrap_or(i64::MAX);
        now_ms.saturating_sub(window)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<i64>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(quota: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            quota,
            window_ms: 60_000,
            cleanup_interval: 100,
        })
    }

    #[test]
    fn test_quota_then_rollover() {
        let limiter = limiter(2);

        assert!(limiter.check("a", 0).is_ok());
        assert!(limiter.check("a", 1).is_ok());
        assert_eq!(
            limiter.check("a", 2),
            Err(RateLimitExceeded {
                quota: 2,
                window_ms: 60_000
            })
        );

        // t=0 and t=1 are both <= 60001 - 60000
        assert!(limiter.check("a", 60_001).is_ok());
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(2);
        limiter.check("a", 0).unwrap();
        limiter.check("a", 1).unwrap();
        assert!(limiter.check("a", 2).is_err());

        assert!(limiter.check("b", 2).is_ok());
    }

    #[test]
    fn test_rejection_is_not_recorded() {
        let limiter = limiter(2);
        limiter.check("a", 0).unwrap();
        limiter.check("a", 1).unwrap();
        assert_eq!(limiter.window_len("a"), 2);

        assert!(limiter.check("a", 2).is_err());
        assert!(limiter.check("a", 3).is_err());
        assert_eq!(limiter.window_len("a"), 2);
    }

    #[test]
    fn test_entry_exactly_at_cutoff_expires() {
        let limiter = limiter(1);
        limiter.check("a", 1_000).unwrap();
        assert!(limiter.check("a", 60_999).is_err());
        assert!(limiter.check("a", 61_000).is_ok());
    }

    #[test]
    fn test_partial_rollover() {
        let limiter = limiter(2);
        limiter.check("a", 0).unwrap();
        limiter.check("a", 30_000).unwrap();

        // only t=0 has expired
        assert!(limiter.check("a", 60_000).is_ok());
        assert!(limiter.check("a", 60_001).is_err());
        assert_eq!(limiter.window_len("a"), 2);
    }

    #[test]
    fn test_prune_drops_only_expired_clients() {
        let limiter = limiter(5);
        limiter.check("old", 0).unwrap();
        limiter.check("fresh", 50_000).unwrap();
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.prune(70_000);
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.window_len("fresh"), 1);
        assert_eq!(limiter.window_len("old"), 0);
    }

    #[test]
    fn test_periodic_cleanup() {
        let limiter = RateLimiter::new(RateLimitConfig {
            quota: 10,
            window_ms: 1_000,
            cleanup_interval: 3,
        });
        limiter.check("a", 0).unwrap();
        limiter.check("b", 0).unwrap();
        limiter.check("c", 0).unwrap();
        assert_eq!(limiter.tracked_clients(), 3);

        // fourth check triggers a sweep before recording "d"
        limiter.check("d", 5_000).unwrap();
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_check_now_uses_wall_clock() {
        let limiter = limiter(1);
        assert!(limiter.check_now("a").is_ok());
        assert!(limiter.check_now("a").is_err());
    }
}
