// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Rate-Limit Counting Backend (Gateway Layer)
//!
//! [`RateLimitBackend`] is the storage capability behind
//! [`crate::application::rate_limiter::SlidingWindowLimiter`]. The in-memory
//! implementation lives in [`crate::infrastructure::rate_limit`]; a shared-store
//! backend for multi-node deployments implements the same two operations and
//! must keep the same sliding-window semantics.

use std::time::Duration;

/// Sliding-window hit store keyed by an opaque tracking key (`"ip:1.2.3.4"`,
/// `"agent:playlist-1"`).
///
/// Implementations must be safe under concurrent calls: two `record_hit` calls
/// on the same key never lose or double-count a hit, and calls on different keys
/// should not serialize on each other.
pub trait RateLimitBackend: Send + Sync {
    /// Drop hits older than `window`, record one hit at "now", and return the
    /// number of hits in the window including the new one.
    fn record_hit(&self, key: &str, window: Duration) -> u64;

    /// Drop hits older than `window` and return how many remain, without recording.
    fn get_count(&self, key: &str, window: Duration) -> u64;
}

/// Result of a single limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    pub remaining: u64,
}
