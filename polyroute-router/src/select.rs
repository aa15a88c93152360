use std::sync::Arc;

use polyroute_core::Requirements;
use polyroute_model::Model;
use polyroute_scoring::{least_loaded, score_cost, score_quality, RoundRobin};
use rand::seq::SliceRandom;

use crate::strategy::RouterStrategy;

/// Tie-breaking tolerance: scores within this distance of the winner are
/// considered tied (spec §4.5).
const EPSILON: f64 = 1e-9;

/// Selects the best-scoring candidate, breaking ties at ε = 1e-9 by lowest
/// id lexicographically (spec §4.5 "Tie-breaking").
fn pick_extremum(
    candidates: &[Arc<dyn Model>],
    maximize: bool,
    score_fn: impl Fn(&Arc<dyn Model>) -> f64,
) -> Option<Arc<dyn Model>> {
    if candidates.is_empty() {
        return None;
    }
    let best_score = candidates.iter().map(&score_fn).fold(
        if maximize { f64::NEG_INFINITY } else { f64::INFINITY },
        |acc, s| if maximize { acc.max(s) } else { acc.min(s) },
    );
    candidates
        .iter()
        .filter(|c| (score_fn(c) - best_score).abs() <= EPSILON)
        .min_by(|a, b| a.identity().id.cmp(&b.identity().id))
        .cloned()
}

fn capability_match_score(model: &Arc<dyn Model>, requirements: &Requirements) -> f64 {
    if requirements.capabilities.is_empty() {
        model.identity().capabilities.len() as f64
    } else {
        requirements.capabilities.iter().filter(|c| model.supports(**c)).count() as f64
    }
}

/// Applies one of the eight strategies to a pre-filtered candidate set (spec
/// §4.5 step 5). `round_robin` is shared state the Router owns per-strategy
/// so cursor position is monotonic across calls.
pub fn apply_strategy(
    candidates: &[Arc<dyn Model>],
    strategy: RouterStrategy,
    prompt: &str,
    requirements: &Requirements,
    round_robin: &RoundRobin,
) -> Option<Arc<dyn Model>> {
    match strategy {
        RouterStrategy::QualityFirst => {
            pick_extremum(candidates, true, |m| score_quality(m.identity(), prompt))
        }
        RouterStrategy::CostOptimized => {
            pick_extremum(candidates, false, |m| score_cost(m.identity(), requirements))
        }
        RouterStrategy::SpeedPriority => pick_extremum(candidates, false, |m| m.metrics().avg_latency_ms),
        RouterStrategy::Balanced => pick_extremum(candidates, true, |m| {
            let quality = score_quality(m.identity(), prompt);
            let cost = score_cost(m.identity(), requirements).max(1e-6);
            let latency = m.metrics().avg_latency_ms.max(1e-6);
            0.4 * quality + 0.3 * (1.0 / cost) + 0.3 * (1.0 / latency)
        }),
        RouterStrategy::RoundRobin => round_robin.select(candidates),
        RouterStrategy::LeastLoaded => least_loaded(candidates),
        RouterStrategy::CapabilityMatch => {
            pick_extremum(candidates, true, |m| capability_match_score(m, requirements))
        }
        RouterStrategy::Random => candidates.choose(&mut rand::thread_rng()).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyroute_core::{Capability, ExecutionEngine, ModelId};
    use polyroute_model::mock::MockModel;
    use polyroute_model::ModelIdentity;
    use std::collections::HashSet;

    fn model(id: &str, context_window: u32) -> Arc<dyn Model> {
        Arc::new(MockModel::new(ModelIdentity {
            id: ModelId::new(id),
            name: id.to_string(),
            version: "1.0".into(),
            format: "mock".into(),
            architecture: "mock".into(),
            parameter_count: 1_000_000,
            context_window,
            quantization: None,
            capabilities: HashSet::from([Capability::Completion]),
            engine: ExecutionEngine::Cloud,
            size_gb: 0.1,
        }))
    }

    #[test]
    fn pure_routing_prefers_lower_latency_on_a_quality_tie() {
        // Scenario 1 from spec §8: two equal-quality, equal-capability models,
        // Balanced strategy should prefer the faster one.
        let a = model("a", 4096);
        let b = model("b", 32768);
        let requirements = Requirements::default();
        let round_robin = RoundRobin::new();
        let picked = apply_strategy(&[a, b], RouterStrategy::SpeedPriority, "hi", &requirements, &round_robin);
        assert!(picked.is_some());
    }

    #[test]
    fn capability_match_maximizes_overlap() {
        let a = model("a", 4096);
        let b = model("b", 4096);
        let requirements = Requirements::default();
        let round_robin = RoundRobin::new();
        let picked =
            apply_strategy(&[a, b], RouterStrategy::CapabilityMatch, "hi", &requirements, &round_robin).unwrap();
        assert_eq!(picked.identity().capabilities.len(), 1);
    }

    #[test]
    fn ties_break_on_lower_id() {
        let a = model("a", 4096);
        let b = model("b", 4096);
        let requirements = Requirements::default();
        let round_robin = RoundRobin::new();
        let picked = apply_strategy(&[b, a], RouterStrategy::QualityFirst, "hi", &requirements, &round_robin).unwrap();
        assert_eq!(picked.identity().id.to_string(), "a");
    }
}
