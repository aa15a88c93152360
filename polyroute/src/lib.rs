//! `polyroute`: a multi-provider LLM router, scorer, pipeline, and
//! orchestrator, composed from the `polyroute-*` family of crates.
//!
//! This crate re-exports each member crate's public surface under one
//! namespace and adds a small [`Polyroute`] convenience type wiring a
//! Registry, Router, Pipeline, Tenancy, and ABTest service together for the
//! common single-process case. Embedding applications that need finer
//! control can depend on the member crates directly instead.

pub use polyroute_core as core;
pub use polyroute_model as model;
pub use polyroute_loader as loader;
pub use polyroute_registry as registry;
pub use polyroute_scoring as scoring;
pub use polyroute_router as router;
pub use polyroute_pipeline as pipeline;
pub use polyroute_tenancy as tenancy;
pub use polyroute_abtest as abtest;
pub use polyroute_telemetry as telemetry;
pub use polyroute_orchestrator as orchestrator;

pub use polyroute_core::{
    BillingRates, Capability, Error, ExecutionEngine, InferenceRequest, InferenceResponse, PipelineConfig,
    PolyrouteConfig, QuotaKind, RegistryConfig, RequestContext, RequestMode, Requirements, Result, RouterConfig,
    StreamChunk, TenancyConfig,
};
pub use polyroute_core::{ExperimentId, ModelId, RequestId, TenantId, UserId};
pub use polyroute_model::{GenerateOptions, GenerateResult, Model, ModelHandle, ModelIdentity, ModelMetrics, ModelState};
pub use polyroute_loader::{detect_format, Loader, ModelDescriptor, ModelSpec};
pub use polyroute_registry::{ListFilter, Registry, RegistrySnapshot, SearchQuery};
pub use polyroute_router::{Router, RouterStrategy};
pub use polyroute_pipeline::Pipeline;
pub use polyroute_tenancy::{IsolationMode, Tenancy, Tenant, TenantStatus};
pub use polyroute_abtest::{ABTest, Experiment, ExperimentStatus, SplittingAlgorithm, Variant};
pub use polyroute_orchestrator::{FallbackEntry, Orchestrator, OrchestratorRequest};
pub use polyroute_telemetry::{init_tracing, TelemetryConfig};

use std::sync::Arc;

/// A fully-wired router stack built from one [`PolyrouteConfig`]: a model
/// Registry, a Router, a Pipeline, a Tenancy service, an ABTest service, and
/// the Orchestrator that composes them per spec §4.9.
pub struct Polyroute {
    pub registry: Arc<Registry>,
    pub router: Arc<Router>,
    pub pipeline: Arc<Pipeline>,
    pub tenancy: Arc<Tenancy>,
    pub abtest: Arc<ABTest>,
    pub orchestrator: Arc<Orchestrator>,
}

impl Polyroute {
    pub fn new(config: PolyrouteConfig) -> Self {
        let registry = Arc::new(Registry::new(config.registry));
        let router = Arc::new(Router::new(registry.clone(), &config.router));
        let pipeline = Arc::new(Pipeline::new(config.pipeline));
        let tenancy = Arc::new(Tenancy::new(config.tenancy));
        let abtest = Arc::new(ABTest::new(config.abtest));
        let orchestrator =
            Arc::new(Orchestrator::new(router.clone(), pipeline.clone(), tenancy.clone(), abtest.clone()));
        Self { registry, router, pipeline, tenancy, abtest, orchestrator }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_fully_wired_stack_from_default_config() {
        let stack = Polyroute::new(PolyrouteConfig::default());
        assert_eq!(stack.registry.size(), 0);
    }
}
