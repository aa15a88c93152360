use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use polyroute_core::ModelId;

/// `{Model id, captured-at}` (spec §3 Route Cache Entry).
#[derive(Debug, Clone)]
struct CacheEntry {
    model_id: ModelId,
    captured_at: DateTime<Utc>,
}

/// In-memory route cache keyed by request fingerprint. TTL is evaluated at
/// read time; an entry older than the configured TTL is a miss (spec §8:
/// "an entry at TTL + ε is treated as miss; at TTL − ε as hit").
pub struct RouteCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl_ms: u64,
    capacity: usize,
}

impl RouteCache {
    pub fn new(ttl_ms: u64, capacity: usize) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl_ms, capacity }
    }

    /// Returns the cached model id if present and not expired.
    pub fn get(&self, fingerprint: &str) -> Option<ModelId> {
        let entries = self.entries.read().expect("route cache lock poisoned");
        let entry = entries.get(fingerprint)?;
        let age_ms = (Utc::now() - entry.captured_at).num_milliseconds().max(0) as u64;
        if age_ms >= self.ttl_ms {
            None
        } else {
            Some(entry.model_id.clone())
        }
    }

    pub fn insert(&self, fingerprint: String, model_id: ModelId) {
        let mut entries = self.entries.write().expect("route cache lock poisoned");
        if entries.len() >= self.capacity && !entries.contains_key(&fingerprint) {
            if let Some(oldest_key) =
                entries.iter().min_by_key(|(_, entry)| entry.captured_at).map(|(key, _)| key.clone())
            {
                entries.remove(&oldest_key);
            }
        }
        entries.insert(fingerprint, CacheEntry { model_id, captured_at: Utc::now() });
    }

    /// Removes every expired entry; run on a periodic timer (spec §4.5: "every
    /// 60s purge expired route-cache entries").
    pub fn purge_expired(&self) {
        let mut entries = self.entries.write().expect("route cache lock poisoned");
        let ttl_ms = self.ttl_ms;
        entries.retain(|_, entry| {
            let age_ms = (Utc::now() - entry.captured_at).num_milliseconds().max(0) as u64;
            age_ms < ttl_ms
        });
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("route cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_a_hit() {
        let cache = RouteCache::new(60_000, 10);
        cache.insert("k".into(), ModelId::new("a"));
        assert_eq!(cache.get("k"), Some(ModelId::new("a")));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = RouteCache::new(0, 10);
        cache.insert("k".into(), ModelId::new("a"));
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn capacity_evicts_the_oldest_entry() {
        let cache = RouteCache::new(60_000, 1);
        cache.insert("first".into(), ModelId::new("a"));
        cache.insert("second".into(), ModelId::new("b"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(ModelId::new("b")));
    }
}
