use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

/// Key → value store where every entry carries its own time-to-live.
///
/// The store never reads the clock: callers pass `now` into every call, which
/// keeps expiry deterministic and lets the owner decide what "now" means.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    entries: HashMap<String, Entry<V>>,
    default_ttl: Duration,
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.stored_at >= self.ttl
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub expired: usize,
    pub active: usize,
    pub default_ttl_secs: i64,
}

impl<V> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    /// Store `value` under `key` with the default TTL.
    pub fn insert(&mut self, key: impl Into<String>, value: V, now: DateTime<Utc>) {
        let ttl = self.default_ttl;
        self.insert_with_ttl(key, value, ttl, now);
    }

    pub fn insert_with_ttl(
        &mut self,
        key: impl Into<String>,
        value: V,
        ttl: Duration,
        now: DateTime<Utc>,
    ) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                stored_at: now,
                ttl,
            },
        );
    }

    /// Live value for `key`. An expired entry is evicted and reported as a miss.
    pub fn get(&mut self, key: &str, now: DateTime<Utc>) -> Option<&V> {
        if self.entries.get(key)?.is_expired(now) {
            debug!(key, "Cache entry expired");
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CacheStats {
        let total = self.entries.len();
        let expired = self.entries.values().filter(|e| e.is_expired(now)).count();
        CacheStats {
            total,
            expired,
            active: total - expired,
            default_ttl_secs: self.default_ttl.num_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn set_and_get_within_ttl() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        cache.insert("btc", 42, t0());
        assert_eq!(cache.get("btc", t0() + Duration::seconds(59)), Some(&42));
    }

    #[test]
    fn missing_key_is_a_miss() {
        let mut cache: TtlCache<u32> = TtlCache::new(Duration::seconds(60));
        assert_eq!(cache.get("nope", t0()), None);
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        cache.insert("btc", 42, t0());
        assert_eq!(cache.get("btc", t0() + Duration::seconds(60)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn per_entry_ttl_overrides_default() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        cache.insert_with_ttl("long", "a", Duration::hours(1), t0());
        cache.insert("short", "b", t0());

        let later = t0() + Duration::minutes(5);
        assert_eq!(cache.get("long", later), Some(&"a"));
        assert_eq!(cache.get("short", later), None);
    }

    #[test]
    fn reinsert_refreshes_timestamp() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        cache.insert("k", 1, t0());
        cache.insert("k", 2, t0() + Duration::seconds(50));
        assert_eq!(cache.get("k", t0() + Duration::seconds(100)), Some(&2));
    }

    #[test]
    fn stats_count_expired_and_active() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        cache.insert("a", 1, t0());
        cache.insert("b", 2, t0() + Duration::seconds(30));
        cache.insert_with_ttl("c", 3, Duration::seconds(10), t0());

        let stats = cache.stats(t0() + Duration::seconds(70));
        assert_eq!(
            stats,
            CacheStats {
                total: 3,
                expired: 2,
                active: 1,
                default_ttl_secs: 60
            }
        );
    }

    #[test]
    fn purge_and_clear() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        cache.insert("a", 1, t0());
        cache.insert("b", 2, t0() + Duration::seconds(45));
        assert_eq!(cache.purge_expired(t0() + Duration::seconds(61)), 1);
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.remove("b"), Some(2));
        cache.insert("c", 3, t0());
        cache.clear();
        assert!(cache.is_empty());
    }
}
