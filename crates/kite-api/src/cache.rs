//! Request cache
//!
//! Time-boxed memoization for read-mostly listings:
//! - A request is identified by its signature (path plus serialized filter)
//! - A fresh entry for a signature means "this was fetched recently", and
//!   the caller skips the network call
//! - Entries expire after a fixed duration (10 minutes by default) and are
//!   never removed, only outlived
//!
//! The cache stores no payloads. A suppressed request yields an empty
//! result; the caller is expected to still hold the data from the first
//! fetch.

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Default freshness window for cache entries
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(10 * 60);

/// One recorded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Request signature
    pub signature: String,
    /// When the request was made
    pub timestamp: DateTime<Utc>,
}

/// Whether a call may be served from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Skip the call if a fresh matching entry exists
    #[default]
    Use,
    /// Always perform the call and leave the cache untouched
    Bypass,
}

/// Outcome of a cache check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// A fresh entry exists; skip the call
    Hit,
    /// No fresh entry; an entry was recorded and the call should proceed
    Miss,
    /// Caching disabled for this call
    Bypassed,
}

impl CacheDecision {
    /// Whether the caller should perform the request
    #[inline]
    #[must_use]
    pub fn should_fetch(self) -> bool {
        !matches!(self, Self::Hit)
    }
}

/// Signature-keyed request memoizer with expiry
#[derive(Debug)]
pub struct RequestCache {
    duration: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<Vec<CacheEntry>>,
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DURATION)
    }
}

impl RequestCache {
    /// Create cache with the given freshness window, reading the system clock
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self::with_clock(duration, Arc::new(SystemClock))
    }

    /// Create cache reading time from `clock`
    #[must_use]
    pub fn with_clock(duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            duration,
            clock,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Freshness window
    #[inline]
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// True if some entry with this signature is younger than the window
    #[must_use]
    pub fn should_use_cache(&self, signature: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .iter()
            .any(|entry| entry.signature == signature && self.is_fresh(entry, now))
    }

    /// Record a request made now
    pub fn record(&self, signature: impl Into<String>) {
        let entry = CacheEntry {
            signature: signature.into(),
            timestamp: self.clock.now(),
        };
        self.entries.lock().push(entry);
    }

    /// Check and record in one step.
    ///
    /// With `CachePolicy::Use`, a fresh entry yields `Hit`; otherwise a new
    /// entry is recorded and `Miss` returned. `CachePolicy::Bypass` touches
    /// nothing.
    pub fn check(&self, signature: &str, policy: CachePolicy) -> CacheDecision {
        if policy == CachePolicy::Bypass {
            tracing::trace!(signature, "cache bypassed");
            return CacheDecision::Bypassed;
        }

        let now = self.clock.now();
        let mut entries = self.entries.lock();
        if entries
            .iter()
            .any(|entry| entry.signature == signature && self.is_fresh(entry, now))
        {
            tracing::debug!(signature, "request served from cache");
            return CacheDecision::Hit;
        }

        entries.push(CacheEntry {
            signature: signature.to_string(),
            timestamp: now,
        });
        tracing::debug!(signature, "request recorded in cache");
        CacheDecision::Miss
    }

    /// Snapshot of all recorded entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.entries.lock().clone()
    }

    /// Number of recorded entries, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Forget everything
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        // Negative age means the clock went backwards; treat as fresh.
        match (now - entry.timestamp).to_std() {
            Ok(age) => age < self.duration,
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache() -> (RequestCache, ManualClock) {
        let clock = ManualClock::starting_now();
        let cache = RequestCache::with_clock(DEFAULT_CACHE_DURATION, Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn first_check_misses_then_hits() {
        let (cache, _clock) = cache();
        assert_eq!(cache.check("designs?limit=50", CachePolicy::Use), CacheDecision::Miss);
        assert_eq!(cache.check("designs?limit=50", CachePolicy::Use), CacheDecision::Hit);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_signatures_are_independent() {
        let (cache, _clock) = cache();
        cache.check("a", CachePolicy::Use);
        assert_eq!(cache.check("b", CachePolicy::Use), CacheDecision::Miss);
        assert!(cache.should_use_cache("a"));
        assert!(cache.should_use_cache("b"));
        assert!(!cache.should_use_cache("c"));
    }

    #[test]
    fn entries_expire_after_window() {
        let (cache, clock) = cache();
        cache.record("a");

        clock.advance(chrono::Duration::minutes(9));
        assert!(cache.should_use_cache("a"));

        clock.advance(chrono::Duration::minutes(2));
        assert!(!cache.should_use_cache("a"));
        assert_eq!(cache.check("a", CachePolicy::Use), CacheDecision::Miss);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn exact_window_is_expired() {
        let (cache, clock) = cache();
        cache.record("a");
        clock.advance(chrono::Duration::minutes(10));
        assert!(!cache.should_use_cache("a"));
    }

    #[test]
    fn bypass_leaves_cache_untouched() {
        let (cache, _clock) = cache();
        assert_eq!(cache.check("a", CachePolicy::Bypass), CacheDecision::Bypassed);
        assert!(cache.is_empty());

        cache.record("a");
        assert_eq!(cache.check("a", CachePolicy::Bypass), CacheDecision::Bypassed);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn any_fresh_entry_counts() {
        let (cache, clock) = cache();
        cache.record("a");
        clock.advance(chrono::Duration::minutes(11));
        cache.record("a");
        assert!(cache.should_use_cache("a"));
        assert_eq!(cache.entries().len(), 2);
    }

    #[test]
    fn decision_should_fetch() {
        assert!(!CacheDecision::Hit.should_fetch());
        assert!(CacheDecision::Miss.should_fetch());
        assert!(CacheDecision::Bypassed.should_fetch());
    }

    #[test]
    fn clear_forgets_entries() {
        let (cache, _clock) = cache();
        cache.record("a");
        cache.clear();
        assert!(!cache.should_use_cache("a"));
    }
}
