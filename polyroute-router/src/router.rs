use std::sync::Arc;
use std::time::Instant;

use polyroute_core::{Error, ModelId, Requirements, Result, RouterConfig};
use polyroute_model::{Model, ModelState};
use polyroute_registry::{ListFilter, Registry};
use polyroute_scoring::RoundRobin;
use tracing::info;

use crate::cache::RouteCache;
use crate::filter::filter_candidates;
use crate::fingerprint::fingerprint;
use crate::select::apply_strategy;
use crate::strategy::RouterStrategy;

/// Strategy-driven model selection with filter → score → cache (spec §4.5).
pub struct Router {
    registry: Arc<Registry>,
    cache: RouteCache,
    round_robin: RoundRobin,
}

impl Router {
    pub fn new(registry: Arc<Registry>, config: &RouterConfig) -> Self {
        Self {
            registry,
            cache: RouteCache::new(config.cache_ttl_ms, config.cache_capacity),
            round_robin: RoundRobin::new(),
        }
    }

    /// Runs the full selection procedure and returns the chosen Model,
    /// already lazily loaded and touched (spec §4.5 steps 1–6).
    pub async fn select(
        &self,
        prompt: &str,
        requirements: &Requirements,
        strategy: RouterStrategy,
    ) -> Result<Arc<dyn Model>> {
        let started = Instant::now();
        let key = fingerprint(prompt, requirements, strategy);

        if let Some(cached_id) = self.cache.get(&key) {
            if let Ok(model) = self.registry.get(&cached_id).await {
                if model.state().is_loaded() {
                    return Ok(model);
                }
            }
            // Stale cache entry: registered model went away or failed to
            // load. Fall through and treat this as a cache miss (spec §5
            // ordering guarantee).
        }

        let all_models = self.registry.list(&ListFilter::default()).await;
        let available: Vec<Arc<dyn Model>> =
            all_models.into_iter().filter(|m| !matches!(m.state(), ModelState::Failed(_))).collect();
        let candidates = filter_candidates(available, requirements);
        if candidates.is_empty() {
            return Err(Error::NoCandidate);
        }

        let selected = apply_strategy(&candidates, strategy, prompt, requirements, &self.round_robin)
            .ok_or(Error::NoCandidate)?;
        let selected_id = selected.identity().id.clone();

        self.cache.insert(key, selected_id.clone());
        let model = self.registry.get(&selected_id).await?;

        info!(
            model_id = %selected_id,
            strategy = ?strategy,
            latency_ms = started.elapsed().as_millis() as u64,
            "model-selected"
        );
        Ok(model)
    }

    pub fn purge_expired_cache(&self) {
        self.cache.purge_expired();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Spawns the two periodic background tasks the spec calls for: a 60s
    /// route-cache reaper and a 300s score recomputation sweep (spec §4.5
    /// "Periodic tasks"). Score recomputation here simply re-touches each
    /// registered model's identity so downstream scorers (pure functions of
    /// current state) observe fresh metrics; there is no cached score to
    /// invalidate since Quality/Cost/Load-balance are computed on demand.
    pub fn spawn_periodic_tasks(self: &Arc<Self>) -> (tokio::task::JoinHandle<()>, tokio::task::JoinHandle<()>) {
        let purge_router = self.clone();
        let purge_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                purge_router.purge_expired_cache();
            }
        });

        let recompute_router = self.clone();
        let recompute_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                let _ = recompute_router.registry.list(&ListFilter::default()).await;
            }
        });

        (purge_handle, recompute_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyroute_core::{Capability, ExecutionEngine, RegistryConfig};
    use polyroute_model::mock::MockModel;
    use polyroute_model::ModelIdentity;
    use std::collections::HashSet;

    fn identity(id: &str, context_window: u32) -> ModelIdentity {
        ModelIdentity {
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
        }
    }

    #[tokio::test]
    async fn no_candidate_when_requirements_exclude_everything() {
        let registry = Arc::new(Registry::new(RegistryConfig::default()));
        registry.register(Arc::new(MockModel::new(identity("a", 4096)))).await.unwrap();
        let router = Router::new(registry, &RouterConfig::default());

        let requirements = Requirements { capabilities: HashSet::from([Capability::Vision]), ..Default::default() };
        let err = router.select("hi", &requirements, RouterStrategy::Balanced).await.unwrap_err();
        assert_eq!(err.kind(), "NoCandidate");
    }

    #[tokio::test]
    async fn repeated_selection_hits_the_route_cache() {
        let registry = Arc::new(Registry::new(RegistryConfig::default()));
        registry.register(Arc::new(MockModel::new(identity("a", 4096)))).await.unwrap();
        let router = Router::new(registry, &RouterConfig::default());

        let requirements = Requirements::default();
        router.select("hi", &requirements, RouterStrategy::Balanced).await.unwrap();
        assert_eq!(router.cache_len(), 1);
        let second = router.select("hi", &requirements, RouterStrategy::Balanced).await.unwrap();
        assert_eq!(second.identity().id.to_string(), "a");
    }

    #[tokio::test]
    async fn capability_match_scenario_from_spec() {
        // Scenario 2 from spec §8.
        let registry = Arc::new(Registry::new(RegistryConfig::default()));
        let mut b_caps = HashSet::from([Capability::Completion, Capability::Streaming]);
        let mut identity_b = identity("b", 4096);
        identity_b.capabilities = b_caps.drain().collect();
        registry.register(Arc::new(MockModel::new(identity("a", 4096)))).await.unwrap();
        registry.register(Arc::new(MockModel::new(identity_b))).await.unwrap();

        let router = Router::new(registry, &RouterConfig::default());
        let requirements = Requirements {
            capabilities: HashSet::from([Capability::Completion, Capability::Streaming]),
            ..Default::default()
        };
        let picked = router.select("hi", &requirements, RouterStrategy::CapabilityMatch).await.unwrap();
        assert_eq!(picked.identity().id.to_string(), "b");
    }
}
