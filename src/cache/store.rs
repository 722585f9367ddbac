//! Response Cache Module
//!
//! HashMap-backed TTL cache for provider responses. There is no size bound and
//! no eviction policy: entries leave on lazy expiry, on sweep, or on `clear`.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::cache::{cache_key, current_timestamp_ms, CacheEntry, CacheStats};

// == Response Cache ==
/// Time-bounded cache of provider responses keyed by `(endpoint, params)`.
///
/// Callers share it as `Arc<RwLock<ResponseCache>>`; every operation replaces
/// or removes whole entries so a reader never sees a partial value.
#[derive(Debug)]
pub struct ResponseCache<T = Value> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Performance statistics
    stats: CacheStats,
    /// TTL used when `set` is called without one
    default_ttl: Duration,
}

impl<T: Clone> ResponseCache<T> {
    // == Constructor ==
    /// Creates an empty cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl,
        }
    }

    // == Get ==
    /// Returns the value cached for `(endpoint, params)` if it has not expired.
    ///
    /// A stale entry is removed and reported as a miss.
    pub fn get(&mut self, endpoint: &str, params: &Value) -> Option<T> {
        let key = cache_key(endpoint, params);
        let now = current_timestamp_ms();

        match self.entries.get(&key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let data = entry.data.clone();
                self.stats.record_hit();
                Some(data)
            }
            Some(_) => {
                self.entries.remove(&key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` for `(endpoint, params)`, replacing any previous entry.
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of the entry, the cache default when `None`
    pub fn set(&mut self, endpoint: &str, params: &Value, value: T, ttl: Option<Duration>) {
        let key = cache_key(endpoint, params);
        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));
        self.entries.insert(key, entry);
    }

    // == Clear ==
    /// Removes every entry of `endpoint`, or everything when `endpoint` is `None`.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&mut self, endpoint: Option<&str>) -> usize {
        let before = self.entries.len();
        match endpoint {
            Some(endpoint) => {
                let prefix = format!("{}:", endpoint);
                self.entries.retain(|key, _| !key.starts_with(&prefix));
            }
            None => self.entries.clear(),
        }
        before - self.entries.len()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    fn cache() -> ResponseCache {
        ResponseCache::new(Duration::from_secs(300))
    }

    #[test]
    fn test_cache_new() {
        let cache = cache();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = cache();
        let params = json!({"vin": "1HGCM82633A004352"});

        cache.set("market-value", &params, json!({"price": 18500}), None);

        assert_eq!(
            cache.get("market-value", &params),
            Some(json!({"price": 18500}))
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let mut cache = cache();
        assert!(cache.get("market-value", &json!({"vin": "x"})).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_get_is_key_order_insensitive() {
        let mut cache = cache();
        let stored: Value = serde_json::from_str(r#"{"vin":"V","zip":"90210","miles":10}"#).unwrap();
        let lookup: Value = serde_json::from_str(r#"{"miles":10,"zip":"90210","vin":"V"}"#).unwrap();

        cache.set("market-value", &stored, json!(1), None);
        assert_eq!(cache.get("market-value", &lookup), Some(json!(1)));
    }

    #[test]
    fn test_overwrite() {
        let mut cache = cache();
        let params = json!({"vin": "V"});

        cache.set("mmr", &params, json!("old"), None);
        cache.set("mmr", &params, json!("new"), None);

        assert_eq!(cache.get("mmr", &params), Some(json!("new")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_expiration_is_lazy() {
        let mut cache = cache();
        let params = json!({"vin": "V"});

        cache.set("mmr", &params, json!(1), Some(Duration::from_millis(50)));
        assert!(cache.get("mmr", &params).is_some());

        sleep(Duration::from_millis(120));

        // Stale entry still occupies a slot until looked up
        assert_eq!(cache.len(), 1);
        assert!(cache.get("mmr", &params).is_none());
        assert_eq!(cache.len(), 0);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_set_refreshes_expired_entry() {
        let mut cache = cache();
        let params = json!({"vin": "V"});

        cache.set("mmr", &params, json!(1), Some(Duration::from_millis(30)));
        sleep(Duration::from_millis(80));
        cache.set("mmr", &params, json!(2), None);

        assert_eq!(cache.get("mmr", &params), Some(json!(2)));
    }

    #[test]
    fn test_clear_endpoint_only() {
        let mut cache = cache();
        let params = json!({"vin": "V"});

        cache.set("vin-report", &params, json!("report"), None);
        cache.set("vin-report", &json!({"vin": "W"}), json!("report2"), None);
        cache.set("market-value", &params, json!("value"), None);

        let removed = cache.clear(Some("vin-report"));

        assert_eq!(removed, 2);
        assert!(cache.get("vin-report", &params).is_none());
        assert_eq!(cache.get("market-value", &params), Some(json!("value")));
    }

    #[test]
    fn test_clear_does_not_match_longer_endpoint_names() {
        let mut cache = cache();
        let params = json!({"vin": "V"});

        cache.set("vin", &params, json!(1), None);
        cache.set("vin-report", &params, json!(2), None);

        assert_eq!(cache.clear(Some("vin")), 1);
        assert_eq!(cache.get("vin-report", &params), Some(json!(2)));
    }

    #[test]
    fn test_clear_all() {
        let mut cache = cache();
        cache.set("a", &json!({}), json!(1), None);
        cache.set("b", &json!({}), json!(2), None);

        assert_eq!(cache.clear(None), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_expired() {
        let mut cache = cache();

        cache.set("a", &json!({}), json!(1), Some(Duration::from_millis(30)));
        cache.set("b", &json!({}), json!(2), Some(Duration::from_secs(10)));

        sleep(Duration::from_millis(80));

        let removed = cache.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b", &json!({})), Some(json!(2)));
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_generic_value_type() {
        let mut cache: ResponseCache<String> = ResponseCache::new(Duration::from_secs(5));
        cache.set("listing", &json!({"id": "abc"}), "cached".to_string(), None);
        assert_eq!(cache.get("listing", &json!({"id": "abc"})).as_deref(), Some("cached"));
    }
}
