//! Global request rate limiter
//!
//! A token bucket shared by every request: refills at a fixed rate and
//! allows short bursts up to its capacity.

use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug)]
pub struct RateLimiter {
    per_second: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl RateLimiter {
    pub fn new(per_second: u32, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            per_second: f64::from(per_second),
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                refilled_at: Instant::now(),
            }),
        }
    }

    /// Take one token if available.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let mut bucket = self
            .bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.per_second).min(self.burst);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_burst_then_reject() {
        let limiter = RateLimiter::new(10, 3);
        let now = Instant::now();

        assert!(limiter.try_acquire_at(now));
        assert!(limiter.try_acquire_at(now));
        assert!(limiter.try_acquire_at(now));
        assert!(!limiter.try_acquire_at(now));
    }

    #[test]
    fn test_refill_over_time() {
        let limiter = RateLimiter::new(10, 1);
        let now = Instant::now();

        assert!(limiter.try_acquire_at(now));
        assert!(!limiter.try_acquire_at(now));
        assert!(limiter.try_acquire_at(now + Duration::from_millis(150)));
    }

    #[test]
    fn test_refill_is_capped_at_burst() {
        let limiter = RateLimiter::new(1000, 2);
        let later = Instant::now() + Duration::from_secs(60);

        assert!(limiter.try_acquire_at(later));
        assert!(limiter.try_acquire_at(later));
        assert!(!limiter.try_acquire_at(later));
    }
}
