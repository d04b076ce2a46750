//! Sliding-window rate limiting for outbound provider calls
//!
//! Providers enforce per-second quotas. Instead of rejecting a call that
//! would exceed the quota, [`RateLimiter::wait_for_slot`] sleeps until the
//! oldest request leaves the window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window for rate limiting
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_second(10)
    }
}

impl RateLimitConfig {
    /// Create a new rate limit config
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
        }
    }

    /// Create config for requests per second
    #[must_use]
    pub fn per_second(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(1))
    }
}

/// In-memory sliding-window limiter for a single provider
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: Mutex::new(VecDeque::new()),
        }
    }

    /// Limiter configuration
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait until a slot is free, then take it.
    ///
    /// The lock is held while sleeping, so concurrent callers are served
    /// one after another in arrival order.
    pub async fn wait_for_slot(&self) {
        let mut requests = self.requests.lock().await;
        loop {
            let wait = self.try_take(&mut requests, Instant::now());
            if wait.is_zero() {
                return;
            }
            debug!(
                wait_ms = wait.as_millis() as u64,
                "Rate limit reached, waiting for next slot"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Take a slot when one is free; otherwise how long until the oldest expires
    fn try_take(&self, requests: &mut VecDeque<Instant>, now: Instant) -> Duration {
        while let Some(oldest) = requests.front() {
            if now.duration_since(*oldest) >= self.config.window {
                requests.pop_front();
            } else {
                break;
            }
        }

        if (requests.len() as u32) < self.config.max_requests {
            requests.push_back(now);
            return Duration::ZERO;
        }

        requests
            .front()
            .map(|oldest| self.config.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(Duration::ZERO)
            .max(Duration::from_millis(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slots_within_quota_are_immediate() {
        let limiter = RateLimiter::new(RateLimitConfig::new(2, Duration::from_secs(60)));
        let started = Instant::now();

        limiter.wait_for_slot().await;
        limiter.wait_for_slot().await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(limiter.requests.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1, Duration::from_millis(30)));
        limiter.wait_for_slot().await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        limiter.wait_for_slot().await;
        // the expired slot was dropped, not waited on
        assert_eq!(limiter.requests.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_slot_waits_instead_of_rejecting() {
        let limiter = RateLimiter::new(RateLimitConfig::new(2, Duration::from_millis(100)));
        let started = Instant::now();

        for _ in 0..3 {
            limiter.wait_for_slot().await;
        }

        // the third call had to wait for the first slot to expire
        assert!(started.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn test_config_never_zero() {
        assert_eq!(RateLimitConfig::per_second(0).max_requests, 1);
        assert_eq!(RateLimitConfig::default().max_requests, 10);
    }
}
