// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # In-Memory Rate-Limit Backend
//!
//! Process-local [`RateLimitBackend`] for single-node deployments.
//!
//! ## Locking
//!
//! Keys live in a [`DashMap`] whose values are `Arc<Mutex<HitLog>>`. The map
//! shard lock is held only long enough to clone the `Arc`; the read-modify-write
//! of a key's timestamps happens under that key's own mutex, so hits on one key
//! are never lost or double-counted and different keys do not contend.
//!
//! ## Cold-key eviction
//!
//! Every `sweep_interval` recorded hits, keys whose newest hit is older than the
//! longest window seen are removed. A removed log is marked `retired` under its
//! mutex; a writer that raced with the sweep and locked a retired log retries
//! against a fresh entry, so eviction never swallows a hit.
//!
//! The sweep runs inline on the hit that crosses the interval. It walks every
//! key, write-locking each map shard and locking each key's mutex in turn, so
//! that one request pays O(tracked keys) and other requests touching a shard
//! under sweep wait for it. Hosts with many distinct keys that want flat
//! request latency set the interval to 0 and call [`InMemoryRateLimitBackend::sweep`]
//! from their own `tokio::time::interval` task.
//!
//! Timestamps come from [`tokio::time::Instant`], which follows the paused test
//! clock.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::rate_limit::RateLimitBackend;

const DEFAULT_SWEEP_INTERVAL: u64 = 1024;

#[derive(Debug, Default)]
struct HitLog {
    hits: VecDeque<Instant>,
    retired: bool,
}

impl HitLog {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.hits.front() {
            if now.saturating_duration_since(*oldest) >= window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_idle(&self, now: Instant, window: Duration) -> bool {
        match self.hits.back() {
            Some(newest) => now.saturating_duration_since(*newest) >= window,
            None => true,
        }
    }
}

pub struct InMemoryRateLimitBackend {
    logs: DashMap<String, Arc<Mutex<HitLog>>>,
    sweep_interval: u64,
    hits_since_sweep: AtomicU64,
    /// Longest window any caller has used, in milliseconds. Sweeps only evict
    /// keys idle for at least this long.
    max_window_ms: AtomicU64,
}

impl InMemoryRateLimitBackend {
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    /// `sweep_interval == 0` disables cold-key eviction.
    pub fn with_sweep_interval(sweep_interval: u64) -> Self {
        Self {
            logs: DashMap::new(),
            sweep_interval,
            hits_since_sweep: AtomicU64::new(0),
            max_window_ms: AtomicU64::new(0),
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.logs.len()
    }

    /// Remove every key with no hit inside the longest window seen.
    pub fn sweep(&self) -> usize {
        let window = Duration::from_millis(self.max_window_ms.load(Ordering::Relaxed));
        let now = Instant::now();
        let before = self.logs.len();
        self.logs.retain(|_, slot| {
            let mut log = slot.lock();
            if log.is_idle(now, window) {
                log.retired = true;
                false
            } else {
                true
            }
        });
        let evicted = before.saturating_sub(self.logs.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.logs.len(), "Evicted idle rate-limit keys");
        }
        evicted
    }

    fn note_window(&self, window: Duration) {
        let ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self.max_window_ms.fetch_max(ms, Ordering::Relaxed);
    }

    fn maybe_sweep(&self) {
        if self.sweep_interval == 0 {
            return;
        }
        let n = self.hits_since_sweep.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.sweep_interval == 0 {
            self.sweep();
        }
    }

    fn slot(&self, key: &str) -> Arc<Mutex<HitLog>> {
        if let Some(existing) = self.logs.get(key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.logs.entry(key.to_string()).or_default().value())
    }
}

impl Default for InMemoryRateLimitBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitBackend for InMemoryRateLimitBackend {
    fn record_hit(&self, key: &str, window: Duration) -> u64 {
        self.note_window(window);
        let count = loop {
            let slot = self.slot(key);
            let mut log = slot.lock();
            if log.retired {
                continue;
            }
            let now = Instant::now();
            log.prune(now, window);
            log.hits.push_back(now);
            break log.hits.len() as u64;
        };
        self.maybe_sweep();
        count
    }

    fn get_count(&self, key: &str, window: Duration) -> u64 {
        let Some(slot) = self.logs.get(key).map(|entry| Arc::clone(entry.value())) else {
            return 0;
        };
        let mut log = slot.lock();
        if log.retired {
            return 0;
        }
        log.prune(Instant::now(), window);
        log.hits.len() as u64
    }
}
