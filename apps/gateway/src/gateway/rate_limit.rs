//! Sliding-window admission control, keyed by caller id.
//!
//! Each caller owns an ordered bucket of admitted timestamps. Prune and append happen
//! under the bucket's shard lock, so two concurrent requests can never both take the
//! last free slot.
//!
//! Single-process only: horizontally scaled deployments each enforce their own window.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

pub const WINDOW: Duration = Duration::from_secs(5 * 60);
pub const MAX_REQUESTS: usize = 30;

pub struct RateLimiter {
    buckets: DashMap<String, VecDeque<Instant>>,
    window: Duration,
    max_requests: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(WINDOW, MAX_REQUESTS)
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            buckets: DashMap::new(),
            window,
            max_requests,
        }
    }

    /// Admits and records the call, or returns `false` when the caller's window is full.
    pub fn allow(&self, caller_id: &str) -> bool {
        let mut bucket = self.buckets.entry(caller_id.to_string()).or_default();
        // Read the clock under the lock so admitted timestamps stay ordered.
        let now = Instant::now();
        self.admit(&mut bucket, now)
    }

    /// `allow` against an explicit clock reading.
    #[cfg(test)]
    pub fn allow_at(&self, caller_id: &str, now: Instant) -> bool {
        let mut bucket = self.buckets.entry(caller_id.to_string()).or_default();
        self.admit(&mut bucket, now)
    }

    fn admit(&self, bucket: &mut VecDeque<Instant>, now: Instant) -> bool {
        // Entries are appended in order, so expired ones are always at the front.
        while bucket
            .front()
            .is_some_and(|&ts| now.saturating_duration_since(ts) > self.window)
        {
            bucket.pop_front();
        }

        if bucket.len() >= self.max_requests {
            return false;
        }

        let stamp = bucket.back().map_or(now, |&last| last.max(now));
        bucket.push_back(stamp);
        true
    }

    /// Drops buckets whose every entry has left the window.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&self, now: Instant) {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| {
            bucket
                .back()
                .is_some_and(|&ts| now.saturating_duration_since(ts) <= self.window)
        });
        debug!(
            "Rate limiter sweep: {} idle buckets dropped, {} live",
            before.saturating_sub(self.buckets.len()),
            self.buckets.len()
        );
    }

    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.window);
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }

    #[cfg(test)]
    fn bucket_len(&self, caller_id: &str) -> usize {
        self.buckets.get(caller_id).map_or(0, |b| b.len())
    }
}
