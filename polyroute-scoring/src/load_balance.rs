use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use polyroute_model::Model;

/// Stateful round-robin cursor (spec §4.4 Load-balance scorer). Monotonic
/// across calls as long as the candidate list's length stays stable.
#[derive(Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self { cursor: AtomicUsize::new(0) }
    }

    pub fn select(&self, candidates: &[Arc<dyn Model>]) -> Option<Arc<dyn Model>> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, AtomicOrdering::Relaxed) % candidates.len();
        Some(candidates[index].clone())
    }
}

/// Picks the candidate with the smallest `concurrent-in-flight` count; ties
/// broken by lower average latency (spec §4.4).
pub fn least_loaded(candidates: &[Arc<dyn Model>]) -> Option<Arc<dyn Model>> {
    candidates
        .iter()
        .min_by(|a, b| {
            let (ma, mb) = (a.metrics(), b.metrics());
            ma.concurrent_in_flight
                .cmp(&mb.concurrent_in_flight)
                .then_with(|| ma.avg_latency_ms.partial_cmp(&mb.avg_latency_ms).unwrap_or(Ordering::Equal))
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyroute_core::{Capability, ExecutionEngine, ModelId};
    use polyroute_model::mock::MockModel;
    use polyroute_model::ModelIdentity;
    use std::collections::HashSet;

    fn model(id: &str) -> Arc<dyn Model> {
        Arc::new(MockModel::new(ModelIdentity {
            id: ModelId::new(id),
            name: id.to_string(),
            version: "1.0".into(),
            format: "mock".into(),
            architecture: "mock".into(),
            parameter_count: 1_000_000,
            context_window: 4096,
            quantization: None,
            capabilities: HashSet::from([Capability::Completion]),
            engine: ExecutionEngine::Cloud,
            size_gb: 0.1,
        }))
    }

    #[test]
    fn round_robin_is_monotonic_over_a_stable_list() {
        let candidates = vec![model("a"), model("b"), model("c")];
        let rr = RoundRobin::new();
        let picks: Vec<String> = (0..6)
            .map(|_| rr.select(&candidates).unwrap().identity().id.to_string())
            .collect();
        assert_eq!(picks, vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn least_loaded_picks_smallest_in_flight() {
        let a = model("a");
        let b = model("b");
        a.load().await.unwrap();
        b.load().await.unwrap();
        // Drive some inferences on `b` so its in-flight/latency differ, then
        // leave it idle again — least_loaded should still prefer whichever
        // has fewer concurrent requests right now (both zero here, so ties
        // break on latency).
        b.generate("warm up", &Default::default()).await.unwrap();
        let candidates = vec![a.clone(), b.clone()];
        let picked = least_loaded(&candidates).unwrap();
        assert_eq!(picked.identity().id.to_string(), "a");
    }
}
