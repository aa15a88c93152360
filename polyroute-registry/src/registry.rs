use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use polyroute_core::{Capability, Error, ModelId, RegistryConfig, Result};
use polyroute_loader::{Loader, ModelDescriptor};
use polyroute_model::Model;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::filter::{apply_limit, ListFilter};
use crate::search::SearchQuery;
use crate::snapshot::RegistrySnapshot;

struct RegistryState {
    models: HashMap<ModelId, Arc<dyn Model>>,
    format_index: HashMap<String, Vec<ModelId>>,
    capability_index: HashMap<Capability, Vec<ModelId>>,
    registered_at: HashMap<ModelId, DateTime<Utc>>,
    loaders: HashMap<String, Arc<dyn Loader>>,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            models: HashMap::new(),
            format_index: HashMap::new(),
            capability_index: HashMap::new(),
            registered_at: HashMap::new(),
            loaders: HashMap::new(),
        }
    }

    fn index(&mut self, model: &Arc<dyn Model>) {
        let identity = model.identity();
        self.format_index.entry(identity.format.clone()).or_default().push(identity.id.clone());
        for capability in Capability::ALL {
            if model.supports(capability) {
                self.capability_index.entry(capability).or_default().push(identity.id.clone());
            }
        }
    }

    fn unindex(&mut self, id: &ModelId) {
        for bucket in self.format_index.values_mut() {
            bucket.retain(|m| m != id);
        }
        for bucket in self.capability_index.values_mut() {
            bucket.retain(|m| m != id);
        }
        self.registered_at.remove(id);
    }

    /// The model whose `lastUsed` (or registration time, if never used) is
    /// the oldest (spec §3 LRU order).
    fn lru_candidate(&self) -> Option<ModelId> {
        self.models
            .values()
            .min_by_key(|model| {
                let identity = model.identity();
                model
                    .metrics()
                    .last_used
                    .or_else(|| self.registered_at.get(&identity.id).copied())
                    .unwrap_or(DateTime::<Utc>::MIN_UTC)
            })
            .map(|model| model.identity().id.clone())
    }
}

/// Owns the Model set, indexes it by format and capability, persists
/// snapshots, and evicts by LRU order when over capacity (spec §4.3).
///
/// Mutating operations serialize through a single write lock; readers see a
/// consistent snapshot of the indexes (spec §5).
pub struct Registry {
    state: RwLock<RegistryState>,
    config: RegistryConfig,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Self { state: RwLock::new(RegistryState::new()), config }
    }

    pub async fn register_loader(&self, loader: Arc<dyn Loader>) {
        let format = loader.format().to_string();
        self.state.write().await.loaders.insert(format, loader);
    }

    /// Validates identity, appends, indexes, evicts LRU if over capacity.
    pub async fn register(&self, model: Arc<dyn Model>) -> Result<()> {
        let id = model.identity().id.clone();
        if model.identity().name.trim().is_empty() {
            return Err(Error::Validation { reason: "model name must not be empty".into() });
        }

        let evicted = {
            let mut state = self.state.write().await;
            if state.models.contains_key(&id) {
                return Err(Error::Validation { reason: format!("model `{id}` already registered") });
            }

            let victim_id = if state.models.len() >= self.config.max_loaded_models {
                state.lru_candidate()
            } else {
                None
            };
            let evicted = victim_id.and_then(|victim| {
                let victim_model = state.models.remove(&victim);
                state.unindex(&victim);
                victim_model.map(|m| (victim, m))
            });

            state.models.insert(id.clone(), model.clone());
            state.registered_at.insert(id.clone(), Utc::now());
            state.index(&model);
            evicted
        };

        if let Some((victim, victim_model)) = evicted {
            let _ = victim_model.unload().await;
            info!(model_id = %victim, "evicted");
        }

        info!(model_id = %id, "registered");
        Ok(())
    }

    /// Returns the Model, lazily loading it; touches `lastUsed`.
    pub async fn get(&self, id: &ModelId) -> Result<Arc<dyn Model>> {
        let model = {
            let state = self.state.read().await;
            state.models.get(id).cloned().ok_or_else(|| Error::NotFound { what: format!("model `{id}`") })?
        };
        model.touch();
        if !model.state().is_loaded() {
            model.load().await?;
        }
        Ok(model)
    }

    pub async fn get_by_format(&self, format: &str) -> Vec<Arc<dyn Model>> {
        let state = self.state.read().await;
        state
            .format_index
            .get(format)
            .into_iter()
            .flatten()
            .filter_map(|id| state.models.get(id).cloned())
            .collect()
    }

    pub async fn get_by_capability(&self, capability: Capability) -> Vec<Arc<dyn Model>> {
        let state = self.state.read().await;
        state
            .capability_index
            .get(&capability)
            .into_iter()
            .flatten()
            .filter_map(|id| state.models.get(id).cloned())
            .collect()
    }

    pub async fn list(&self, filter: &ListFilter) -> Vec<Arc<dyn Model>> {
        let state = self.state.read().await;
        let matched: Vec<Arc<dyn Model>> =
            state.models.values().filter(|m| filter.matches(m.as_ref())).cloned().collect();
        apply_limit(matched, filter.limit)
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Arc<dyn Model>>> {
        let regex = query.compile()?;
        let state = self.state.read().await;
        Ok(state
            .models
            .values()
            .filter(|m| {
                let identity = m.identity();
                let format_ok = query.format.as_deref().map(|f| f == identity.format).unwrap_or(true);
                format_ok && regex.is_match(&identity.name)
            })
            .cloned()
            .collect())
    }

    /// Selects the Model with the oldest `lastUsed`, calls its release hook,
    /// removes it from all indexes.
    pub async fn evict_lru(&self) -> Result<Option<ModelId>> {
        let (victim, model) = {
            let mut state = self.state.write().await;
            let Some(victim) = state.lru_candidate() else {
                return Ok(None);
            };
            let model = state.models.remove(&victim);
            state.unindex(&victim);
            (victim, model)
        };
        if let Some(model) = model {
            model.unload().await?;
        }
        info!(model_id = %victim, "evicted");
        Ok(Some(victim))
    }

    pub async fn size(&self) -> usize {
        self.state.read().await.models.len()
    }

    /// Builds a [`RegistrySnapshot`] in memory from the current Model set via
    /// each Model's own descriptor fields. Requires every registered model
    /// to be reconstructable through a Loader on reload. Use
    /// [`Registry::persist_snapshot`] to additionally write it to disk.
    pub async fn save_snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read().await;
        let models = state
            .models
            .values()
            .map(|model| {
                let identity = model.identity();
                ModelDescriptor {
                    id: identity.id.clone(),
                    name: identity.name.clone(),
                    version: identity.version.clone(),
                    format: identity.format.clone(),
                    architecture: identity.architecture.clone(),
                    parameter_count: identity.parameter_count,
                    context_window: identity.context_window,
                    quantization: identity.quantization.clone(),
                    capabilities: Capability::ALL.iter().copied().filter(|c| model.supports(*c)).collect(),
                    engine: identity.engine,
                    size_gb: identity.size_gb,
                    source: identity.name.clone(),
                    loaded: model.state().is_loaded(),
                }
            })
            .collect();
        RegistrySnapshot::new(models)
    }

    /// Rebuilds the Model set from a snapshot via registered Loaders. A
    /// descriptor whose format has no registered Loader is skipped with a
    /// warning, not an error (spec §4.3 invariant).
    pub async fn load_snapshot(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        for descriptor in &snapshot.models {
            let loader = {
                let state = self.state.read().await;
                state.loaders.get(&descriptor.format).cloned()
            };
            let Some(loader) = loader else {
                warn!(format = %descriptor.format, model_id = %descriptor.id, "no loader registered, skipping");
                continue;
            };
            let model = loader.from_snapshot(descriptor).await?;
            if descriptor.loaded {
                model.load().await?;
            }
            self.register(model).await?;
        }
        Ok(())
    }

    /// Builds a snapshot and atomically writes it under `RegistryConfig.snapshot_dir`
    /// (spec §6 I/O suspension point "Registry snapshot save/load").
    pub async fn persist_snapshot(&self) -> Result<()> {
        let path = self.snapshot_path()?;
        let snapshot = self.save_snapshot().await;
        snapshot.save_to(&path).await
    }

    /// Reads the snapshot written by [`Registry::persist_snapshot`] from
    /// `RegistryConfig.snapshot_dir` and rebuilds the Model set from it.
    pub async fn restore_snapshot(&self) -> Result<()> {
        let path = self.snapshot_path()?;
        let snapshot = RegistrySnapshot::load_from(&path).await?;
        self.load_snapshot(&snapshot).await
    }

    fn snapshot_path(&self) -> Result<PathBuf> {
        let dir = self
            .config
            .snapshot_dir
            .as_ref()
            .ok_or_else(|| Error::Validation { reason: "snapshot_dir is not configured".into() })?;
        Ok(PathBuf::from(dir).join(RegistrySnapshot::FILE_NAME))
    }
}
