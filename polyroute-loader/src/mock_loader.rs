use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use polyroute_core::{Capability, ExecutionEngine, ModelId, Result};
use polyroute_model::mock::MockModel;
use polyroute_model::{Model, ModelIdentity};

use crate::spec::{ModelDescriptor, ModelSpec};
use crate::trait_def::Loader;

/// Produces in-memory [`MockModel`]s for the `mock` format tag. Used for
/// tests and local development without a real backend.
pub struct MockLoader;

fn identity_from_spec(spec: &ModelSpec) -> ModelIdentity {
    let id = spec.id.clone().unwrap_or_else(|| ModelId::new(spec.source.clone()));
    ModelIdentity {
        id,
        name: spec.source.clone(),
        version: "0.0.0".into(),
        format: "mock".into(),
        architecture: "mock".into(),
        parameter_count: spec
            .options
            .get("parameter_count")
            .and_then(|v| v.as_u64())
            .unwrap_or(1_000_000),
        context_window: spec.options.get("context_window").and_then(|v| v.as_u64()).unwrap_or(4096) as u32,
        quantization: None,
        capabilities: HashSet::from([Capability::Completion, Capability::Chat, Capability::Streaming]),
        engine: ExecutionEngine::Cloud,
        size_gb: 0.01,
    }
}

#[async_trait]
impl Loader for MockLoader {
    fn format(&self) -> &str {
        "mock"
    }

    async fn load(&self, spec: &ModelSpec) -> Result<Arc<dyn Model>> {
        Ok(Arc::new(MockModel::new(identity_from_spec(spec))))
    }

    async fn from_snapshot(&self, descriptor: &ModelDescriptor) -> Result<Arc<dyn Model>> {
        let identity = ModelIdentity {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            format: descriptor.format.clone(),
            architecture: descriptor.architecture.clone(),
            parameter_count: descriptor.parameter_count,
            context_window: descriptor.context_window,
            quantization: descriptor.quantization.clone(),
            capabilities: descriptor.capabilities.iter().copied().collect(),
            engine: descriptor.engine,
            size_gb: descriptor.size_gb,
        };
        Ok(Arc::new(MockModel::new(identity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_assigns_id_from_source_when_absent() {
        let loader = MockLoader;
        let spec = ModelSpec::new("mock://echo");
        let model = loader.load(&spec).await.unwrap();
        assert_eq!(model.identity().id.as_str(), "mock://echo");
    }
}
