use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use polyroute_core::{ModelId, Requirements};
use polyroute_model::GenerateResult;

/// Composes the response-cache key from `(model.id, prompt, canonicalized
/// options)` (spec §4.6 step 1).
///
/// As with the route cache, this hashes the full prompt rather than
/// truncating to its first 50 characters — the source's truncation is a
/// documented collision hazard (see [`polyroute_router::fingerprint`]); the
/// same fix applies here for consistency.
pub fn response_cache_key(model_id: &ModelId, prompt: &str, requirements: &Requirements) -> String {
    let mut hasher = DefaultHasher::new();
    model_id.hash(&mut hasher);
    prompt.hash(&mut hasher);
    requirements.max_tokens.hash(&mut hasher);
    requirements.temperature.map(f32::to_bits).hash(&mut hasher);
    requirements.template.hash(&mut hasher);
    requirements.system_prompt.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

struct CacheEntry {
    result: GenerateResult,
    cached_at: DateTime<Utc>,
}

/// TTL'd, capacity-bounded cache of normalized generation results (spec §4.6
/// step 6, default TTL 3600s).
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl_ms: u64,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(ttl_ms: u64, capacity: usize) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl_ms, capacity }
    }

    pub fn get(&self, key: &str) -> Option<GenerateResult> {
        let entries = self.entries.read().expect("response cache lock poisoned");
        let entry = entries.get(key)?;
        let age_ms = (Utc::now() - entry.cached_at).num_milliseconds().max(0) as u64;
        if age_ms >= self.ttl_ms {
            None
        } else {
            Some(entry.result.clone())
        }
    }

    pub fn insert(&self, key: String, result: GenerateResult) {
        let mut entries = self.entries.write().expect("response cache lock poisoned");
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(oldest) = entries.iter().min_by_key(|(_, e)| e.cached_at).map(|(k, _)| k.clone()) {
                entries.remove(&oldest);
            }
        }
        entries.insert(key, CacheEntry { result, cached_at: Utc::now() });
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("response cache lock poisoned").len()
    }
}
