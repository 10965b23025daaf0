//! TTL caches with an injectable clock.
//!
//! Provenance heights and registration verdicts are cached per key for a
//! short, fixed window. Entries are replaced wholesale on insert and never
//! refreshed in the background: the first access after expiry is a miss.
//!
//! The clock is injected so tests can drive expiry with [`ManualClock`]
//! instead of sleeping.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default cache capacity (keys per cache).
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default time-to-live for cache entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Source of the current time for cache expiry.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}

/// A cached value and the instant it stops being served.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cached value.
    pub value: V,
    /// First instant at which the entry is stale; `None` when the TTL runs
    /// past the clock's representable range.
    pub expires_at: Option<Instant>,
}

/// Cache statistics for monitoring.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (absent or expired).
    pub misses: u64,
    /// Number of entries written.
    pub additions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = (self.hits as f64 / total as f64) * 100.0;
            rate
        }
    }
}

/// String-keyed TTL cache, bounded by LRU eviction.
#[derive(Clone)]
pub struct TtlCache<V> {
    inner: Arc<Mutex<LruCache<String, CacheEntry<V>>>>,
    stats: Arc<Mutex<CacheStats>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with default capacity.
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY, ttl, clock)
    }

    /// Create a new cache with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(cap))),
            stats: Arc::new(Mutex::new(CacheStats::default())),
            ttl,
            clock,
        }
    }

    /// Look up a live entry.
    ///
    /// An expired entry is dropped and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut cache = self.inner.lock();

        let fresh = cache
            .peek(key)
            .is_some_and(|entry| entry.expires_at.map_or(true, |at| now < at));
        let live = if fresh {
            cache.get(key).map(|entry| entry.value.clone())
        } else {
            cache.pop(key);
            None
        };

        let mut stats = self.stats.lock();
        if live.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }

        live
    }

    /// Store a value, replacing any previous entry and restarting its TTL.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now().checked_add(self.ttl),
        };
        self.inner.lock().put(key.into(), entry);
        self.stats.lock().additions += 1;
    }

    /// Time-to-live applied to new entries.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Get the current number of entries, including not-yet-evicted stale ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
