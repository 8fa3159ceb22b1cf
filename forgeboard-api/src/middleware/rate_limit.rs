/// In-process sliding-window rate limiting
///
/// Each guarded surface (login, password reset, contact intake) owns a
/// [`RateLimiter`] keyed by a caller-derived identity string (email + IP,
/// user ID, or IP). Timestamps older than the window are pruned on every
/// check, so a limiter never grows beyond its active identities.
///
/// State is process-local: a multi-instance deployment rate limits per
/// instance. Limits here are abuse brakes, not quotas, so that is
/// acceptable.
///
/// # Example
///
/// ```
/// use forgeboard_api::middleware::rate_limit::RateLimiter;
/// use std::time::Duration;
///
/// let limiter = RateLimiter::new(3, Duration::from_secs(60));
/// assert!(limiter.check("user@example.com").is_ok());
/// ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::ApiError;

/// Sliding-window rate limiter keyed by identity string
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window` per identity
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Records a hit for the identity, rejecting it if the window is full
    ///
    /// On rejection returns `ApiError::RateLimitExceeded` with a
    /// `Retry-After` value derived from the oldest hit in the window.
    pub fn check(&self, identity: &str) -> Result<(), ApiError> {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());

        // Evict identities whose newest hit has left the window; identity
        // strings are caller-derived, so stale ones must not accumulate
        hits.retain(|_, entry| {
            entry
                .back()
                .is_some_and(|&newest| now.duration_since(newest) < self.window)
        });

        let entry = hits.entry(identity.to_string()).or_default();

        // Prune entries that have left the window
        while let Some(&front) = entry.front() {
            if now.duration_since(front) >= self.window {
                entry.pop_front();
            } else {
                break;
            }
        }

        if entry.len() >= self.max_requests as usize {
            let retry_after = entry
                .front()
                .map(|&oldest| {
                    self.window
                        .saturating_sub(now.duration_since(oldest))
                        .as_secs()
                        .max(1)
                })
                .unwrap_or(1);

            return Err(ApiError::RateLimitExceeded {
                retry_after,
                message: "Too many requests, please try again later".to_string(),
            });
        }

        entry.push_back(now);

        Ok(())
    }

    /// Clears all recorded hits for an identity
    pub fn reset(&self, identity: &str) {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        hits.remove(identity);
    }

    /// Number of identities currently tracked
    pub fn tracked_identities(&self) -> usize {
        let hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());
    }

    #[test]
    fn test_identities_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("b").is_ok());
        assert!(limiter.check("a").is_err());
        assert!(limiter.check("b").is_err());
    }

    #[test]
    fn test_window_expiry_frees_slots() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));

        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());

        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn test_rejection_carries_retry_after() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.check("a").unwrap();

        match limiter.check("a") {
            Err(ApiError::RateLimitExceeded { retry_after, .. }) => {
                assert!(retry_after >= 1);
                assert!(retry_after <= 60);
            }
            other => panic!("expected rate limit rejection, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_expired_identities_are_evicted() {
        let limiter = RateLimiter::new(2, Duration::from_millis(10));

        for i in 0..1000 {
            assert!(limiter.check(&format!("ip-{}", i)).is_ok());
        }
        assert_eq!(limiter.tracked_identities(), 1000);

        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check("fresh").is_ok());

        assert_eq!(limiter.tracked_identities(), 1);
    }

    #[test]
    fn test_reset_clears_identity() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.check("a").unwrap();
        assert!(limiter.check("a").is_err());

        limiter.reset("a");
        assert!(limiter.check("a").is_ok());
        assert_eq!(limiter.tracked_identities(), 1);
    }
}
