//! Get-or-compute caches for expensive external lookups.
//!
//! A single [`Cache`] type covers both policies used by enrichment:
//! unbounded without expiry (vhost lookups) and bounded with a TTL (git lookups).
//! Failed resolutions are stored like successful ones so a permanently
//! unresolvable key costs one external call per cache lifetime.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod enrichment;

pub use enrichment::{EnrichmentCaches, BLAME_CAPACITY, GIT_CAPACITY, GIT_TTL};

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Size and expiry limits for a [`Cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    capacity: Option<NonZeroUsize>,
    ttl: Option<Duration>,
}

impl CachePolicy {
    /// No size bound, entries never expire.
    pub const fn unbounded() -> Self {
        Self {
            capacity: None,
            ttl: None,
        }
    }

    /// At most `capacity` entries, each valid for `ttl` after insertion.
    ///
    /// A capacity of zero is treated as one.
    pub fn bounded(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: Some(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            ttl: Some(ttl),
        }
    }

    /// Maximum entry count, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity.map(NonZeroUsize::get)
    }

    /// Entry lifetime, `None` when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| now.saturating_duration_since(self.inserted_at) >= ttl)
    }
}

/// Keyed get-or-compute cache.
///
/// Lookups never refresh an entry's position, so eviction on a full bounded
/// cache removes the oldest insertion, which is also the earliest expiry.
pub struct Cache<K, V> {
    entries: LruCache<K, CacheEntry<V>>,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
}

impl<K: Hash + Eq, V: Clone> Cache<K, V> {
    /// Create an empty cache reading time from the system clock.
    pub fn new(policy: CachePolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// Create an empty cache with an explicit clock.
    pub fn with_clock(policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        let entries = match policy.capacity {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            entries,
            policy,
            clock,
        }
    }

    /// Return the cached value for `key`, or run `resolve` once and cache its result.
    ///
    /// An expired entry counts as a miss.
    pub fn get_or_compute<F>(&mut self, key: K, resolve: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        let now = self.clock.now();

        if let Some(entry) = self.entries.peek(&key) {
            if !entry.is_expired(now, self.policy.ttl) {
                return entry.value.clone();
            }
        }

        let value = resolve(&key);
        self.purge_expired(now);
        self.entries.push(
            key,
            CacheEntry {
                value: value.clone(),
                inserted_at: now,
            },
        );
        value
    }

    /// Cached value for `key` if present and not expired. Does not resolve.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        self.entries
            .peek(key)
            .filter(|entry| !entry.is_expired(now, self.policy.ttl))
            .map(|entry| &entry.value)
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The policy this cache was built with.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    // Entries are ordered by insertion and share one TTL, so expired ones sit at the LRU end.
    fn purge_expired(&mut self, now: Instant) {
        let ttl = self.policy.ttl;
        while self
            .entries
            .peek_lru()
            .is_some_and(|(_, entry)| entry.is_expired(now, ttl))
        {
            self.entries.pop_lru();
        }
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("len", &self.entries.len())
            .field("policy", &self.policy)
            .finish()
    }
}
