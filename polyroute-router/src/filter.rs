use std::sync::Arc;

use polyroute_core::Requirements;
use polyroute_model::Model;

/// Step 3 of the selection procedure: required capabilities must all be
/// supported; `maxSize`, if set, must be ≥ parameter count; an explicit
/// `format` must match (spec §4.5).
pub fn filter_candidates(models: Vec<Arc<dyn Model>>, requirements: &Requirements) -> Vec<Arc<dyn Model>> {
    models
        .into_iter()
        .filter(|model| {
            let identity = model.identity();
            if !requirements.capabilities.iter().all(|c| model.supports(*c)) {
                return false;
            }
            if let Some(max_size) = requirements.max_size {
                if identity.parameter_count > max_size {
                    return false;
                }
            }
            if let Some(format) = &requirements.format {
                if &identity.format != format {
                    return false;
                }
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyroute_core::{Capability, ExecutionEngine, ModelId};
    use polyroute_model::mock::MockModel;
    use polyroute_model::ModelIdentity;
    use std::collections::HashSet;

    fn model(id: &str, capabilities: &[Capability], parameter_count: u64, format: &str) -> Arc<dyn Model> {
        Arc::new(MockModel::new(ModelIdentity {
            id: ModelId::new(id),
            name: id.to_string(),
            version: "1.0".into(),
            format: format.to_string(),
            architecture: "mock".into(),
            parameter_count,
            context_window: 4096,
            quantization: None,
            capabilities: capabilities.iter().copied().collect::<HashSet<_>>(),
            engine: ExecutionEngine::Cloud,
            size_gb: 0.1,
        }))
    }

    #[test]
    fn capability_match_filter_narrows_to_the_superset_model() {
        let a = model("a", &[Capability::Completion], 1, "mock");
        let b = model("b", &[Capability::Completion, Capability::Streaming], 1, "mock");
        let requirements =
            Requirements { capabilities: HashSet::from([Capability::Completion, Capability::Streaming]), ..Default::default() };
        let filtered = filter_candidates(vec![a, b.clone()], &requirements);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].identity().id.to_string(), "b");
    }

    #[test]
    fn max_size_excludes_larger_models() {
        let small = model("small", &[], 1_000, "mock");
        let large = model("large", &[], 1_000_000, "mock");
        let requirements = Requirements { max_size: Some(10_000), ..Default::default() };
        let filtered = filter_candidates(vec![small, large], &requirements);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].identity().id.to_string(), "small");
    }
}
