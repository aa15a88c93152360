use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use polyroute_core::{ExperimentId, UserId};

use crate::experiment::Variant;

/// Deterministic fraction in `[0, 1)` for a `(userId, experimentId)` pair
/// (spec §4.8 step 1). `DefaultHasher` is SipHash seeded with fixed keys, so
/// this is stable across processes and runs — exactly the determinism
/// requirement the spec demands.
pub fn hash_fraction(user_id: &UserId, experiment_id: &ExperimentId) -> f64 {
    let mut hasher = DefaultHasher::new();
    user_id.hash(&mut hasher);
    b"|".hash(&mut hasher);
    experiment_id.hash(&mut hasher);
    let bits = hasher.finish();
    (bits % (1u64 << 32)) as f64 / (1u64 << 32) as f64
}

/// Admission check (spec §4.8 step 1): include iff `h < trafficPercentage/100`
/// and targeting passes.
pub fn is_admitted(h: f64, traffic_percentage: f64, targeting_passes: bool) -> bool {
    targeting_passes && h < traffic_percentage / 100.0
}

/// Walks cumulative allocation and returns the first variant whose
/// cumulative sum is `>= h` (spec §4.8 step 2, random/hash-based splitting).
/// Falls back to the last variant if rounding leaves `h` past the final
/// cumulative boundary.
pub fn pick_by_cumulative_walk<'a>(h: f64, variants: &'a [Variant]) -> Option<&'a Variant> {
    let mut cumulative = 0.0;
    for variant in variants {
        cumulative += variant.allocation;
        if cumulative >= h {
            return Some(variant);
        }
    }
    variants.last()
}

/// Applies per-segment allocation multipliers then re-normalizes so the
/// adjusted allocations still sum to 1 before the cumulative walk runs
/// (spec §4.8 step 2, "weighted": "allocations are adjusted ... then
/// re-normalized"). Naively adjusting without this step — the documented
/// bug this fixes — leaves the cumulative walk operating over a
/// distribution that no longer sums to 1, silently under- or
/// over-allocating traffic to the last variants.
pub fn weighted_allocations(variants: &[Variant], segment_multipliers: &HashMap<String, f64>) -> Vec<Variant> {
    let adjusted: Vec<f64> = variants
        .iter()
        .map(|v| v.allocation * segment_multipliers.get(&v.name).copied().unwrap_or(1.0))
        .collect();
    let total: f64 = adjusted.iter().sum();
    if total <= 0.0 {
        return variants.to_vec();
    }
    variants
        .iter()
        .zip(adjusted)
        .map(|(v, a)| Variant { name: v.name.clone(), allocation: a / total, overrides: v.overrides.clone() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_fraction_is_deterministic_and_bounded() {
        let u = UserId::new("u1");
        let e = ExperimentId::new("e1");
        let h1 = hash_fraction(&u, &e);
        let h2 = hash_fraction(&u, &e);
        assert_eq!(h1, h2);
        assert!((0.0..1.0).contains(&h1));
    }

    #[test]
    fn different_experiments_yield_different_fractions_almost_always() {
        let u = UserId::new("u1");
        let h1 = hash_fraction(&u, &ExperimentId::new("e1"));
        let h2 = hash_fraction(&u, &ExperimentId::new("e2"));
        assert_ne!(h1, h2);
    }

    #[test]
    fn cumulative_walk_picks_the_first_boundary_crossed() {
        let variants = vec![Variant::new("a", 0.3), Variant::new("b", 0.7)];
        assert_eq!(pick_by_cumulative_walk(0.1, &variants).unwrap().name, "a");
        assert_eq!(pick_by_cumulative_walk(0.5, &variants).unwrap().name, "b");
        assert_eq!(pick_by_cumulative_walk(0.99, &variants).unwrap().name, "b");
    }

    #[test]
    fn weighted_allocations_still_sum_to_one_after_adjustment() {
        let variants = vec![Variant::new("a", 0.5), Variant::new("b", 0.5)];
        let mut multipliers = HashMap::new();
        multipliers.insert("a".to_string(), 2.0);
        let adjusted = weighted_allocations(&variants, &multipliers);
        let total: f64 = adjusted.iter().map(|v| v.allocation).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(adjusted[0].allocation > adjusted[1].allocation);
    }

    #[test]
    fn empty_multipliers_leave_allocations_unchanged() {
        let variants = vec![Variant::new("a", 0.3), Variant::new("b", 0.7)];
        let adjusted = weighted_allocations(&variants, &HashMap::new());
        assert!((adjusted[0].allocation - 0.3).abs() < 1e-9);
    }
}
