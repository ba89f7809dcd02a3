// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Sliding-Window Rate Limiter (Gateway Layer)
//!
//! Quota is evaluated over the trailing `window` ending at "now", never over
//! fixed-epoch buckets, so a burst straddling a bucket boundary is still caught.
//!
//! Every [`SlidingWindowLimiter::check`] consumes one unit of quota, including
//! the call that gets rejected.
//!
//! ```text
//! count     = backend.record_hit(key, window)   // prune, append now, count
//! allowed   = count <= max_requests
//! remaining = max(0, max_requests - count)
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::domain::rate_limit::{RateLimitBackend, RateLimitOutcome};
use crate::infrastructure::rate_limit::InMemoryRateLimitBackend;

#[derive(Clone)]
pub struct SlidingWindowLimiter {
    max_requests: u32,
    window: Duration,
    backend: Arc<dyn RateLimitBackend>,
}

impl SlidingWindowLimiter {
    /// Limiter over a private in-memory backend.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_backend(max_requests, window, Arc::new(InMemoryRateLimitBackend::new()))
    }

    pub fn with_backend(
        max_requests: u32,
        window: Duration,
        backend: Arc<dyn RateLimitBackend>,
    ) -> Self {
        Self {
            max_requests,
            window,
            backend,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Window length in whole seconds, as advertised in `Retry-After`.
    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    /// Record a hit for `key` and decide whether it is within quota.
    pub fn check(&self, key: &str) -> RateLimitOutcome {
        let count = self.backend.record_hit(key, self.window);
        RateLimitOutcome {
            allowed: count <= u64::from(self.max_requests),
            remaining: self.remaining_after(count),
        }
    }

    /// Remaining quota for `key` without consuming any.
    pub fn remaining_without_recording(&self, key: &str) -> u64 {
        let count = self.backend.get_count(key, self.window);
        self.remaining_after(count)
    }

    fn remaining_after(&self, count: u64) -> u64 {
        u64::from(self.max_requests).saturating_sub(count)
    }
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_exactly_max_requests_allowed() {
        let limiter = SlidingWindowLimiter::new(5, Duration::from_secs(60));
        for i in 0..5 {
            let outcome = limiter.check("ip:10.0.0.1");
            assert!(outcome.allowed, "request {} should pass", i + 1);
            assert_eq!(outcome.remaining, 4 - i);
        }
        let sixth = limiter.check("ip:10.0.0.1");
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_checks_still_consume_quota() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(10));
        assert!(limiter.check("k").allowed);
        assert!(!limiter.check("k").allowed);
        assert!(!limiter.check("k").allowed);

        // Three hits recorded; the window must fully roll over before quota returns.
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(limiter.check("k").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_returns_after_window() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("agent:a").allowed);
        }
        assert!(!limiter.check("agent:a").allowed);

        tokio::time::advance(Duration::from_secs(61)).await;
        let outcome = limiter.check("agent:a");
        assert!(outcome.allowed);
        assert_eq!(outcome.remaining, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides_rather_than_resets() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("k").allowed); // t=0
        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(limiter.check("k").allowed); // t=40
        tokio::time::advance(Duration::from_secs(30)).await;
        // t=70: the t=0 hit fell out, the t=40 hit is still inside.
        assert!(limiter.check("k").allowed);
        assert!(!limiter.check("k").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_without_recording() {
        let limiter = SlidingWindowLimiter::new(10, Duration::from_secs(60));
        assert_eq!(limiter.remaining_without_recording("fresh"), 10);
        limiter.check("fresh");
        limiter.check("fresh");
        assert_eq!(limiter.remaining_without_recording("fresh"), 8);
        assert_eq!(limiter.remaining_without_recording("fresh"), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("ip:1.1.1.1").allowed);
        assert!(limiter.check("ip:2.2.2.2").allowed);
        assert!(!limiter.check("ip:1.1.1.1").allowed);
    }

    #[test]
    fn test_concurrent_checks_admit_exactly_quota() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let limiter = Arc::new(SlidingWindowLimiter::new(37, Duration::from_secs(3600)));
        let admitted = Arc::new(AtomicU64::new(0));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        if limiter.check("ip:203.0.113.1").allowed {
                            admitted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(admitted.load(Ordering::Relaxed), 37);
        assert_eq!(limiter.remaining_without_recording("ip:203.0.113.1"), 0);
    }

    #[test]
    fn test_retry_after_is_window_seconds() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        assert_eq!(limiter.retry_after_secs(), 60);
    }
}
