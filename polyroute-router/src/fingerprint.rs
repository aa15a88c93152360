use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use polyroute_core::Requirements;

use crate::strategy::RouterStrategy;

/// Route-cache key: a hash of the full prompt, canonicalized requirements,
/// and strategy.
///
/// The source this system was distilled from truncated the prompt to its
/// first 50 characters as the cache identity, which is a known collision
/// hazard (two distinct long prompts sharing a 50-character prefix would
/// wrongly hit each other's cached route). This hashes the full prompt
/// instead; the 50-character bound is kept only as an eviction heuristic in
/// [`crate::cache::RouteCache`], never as part of the identity key.
pub fn fingerprint(prompt: &str, requirements: &Requirements, strategy: RouterStrategy) -> String {
    let mut hasher = DefaultHasher::new();
    prompt.hash(&mut hasher);
    canonicalize_requirements(requirements).hash(&mut hasher);
    strategy.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn canonicalize_requirements(requirements: &Requirements) -> String {
    let mut capabilities: Vec<String> = requirements.capabilities.iter().map(|c| format!("{c:?}")).collect();
    capabilities.sort();

    format!(
        "caps={}|format={:?}|max_size={:?}|preferred={:?}|max_tokens={:?}|temperature={:?}|template={:?}|system_prompt={:?}",
        capabilities.join(","),
        requirements.format,
        requirements.max_size,
        requirements.preferred_model.as_ref().map(|m| m.to_string()),
        requirements.max_tokens,
        requirements.temperature.map(|t| t.to_bits()),
        requirements.template,
        requirements.system_prompt,
    )
}
