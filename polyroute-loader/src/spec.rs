use std::collections::HashMap;

use polyroute_core::{Capability, ExecutionEngine, ModelId};
use serde::{Deserialize, Serialize};

/// A request to materialize a `Model`, as submitted to `Loader::load` (spec
/// §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub source: String,
    pub format: Option<String>,
    pub id: Option<ModelId>,
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,
}

impl ModelSpec {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into(), format: None, id: None, options: HashMap::new() }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_id(mut self, id: ModelId) -> Self {
        self.id = Some(id);
        self
    }
}

/// A serializable descriptor persisted by the Registry's snapshot mechanism
/// and handed back to `Loader::from_snapshot` on reload (spec §3 Registry
/// Snapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: ModelId,
    pub name: String,
    pub version: String,
    pub format: String,
    pub architecture: String,
    pub parameter_count: u64,
    pub context_window: u32,
    pub quantization: Option<String>,
    pub capabilities: Vec<Capability>,
    pub engine: ExecutionEngine,
    pub size_gb: f64,
    pub source: String,
    /// Hint for whether the model was loaded at snapshot time; reload does
    /// not eagerly re-load, only records the hint (spec §8 round-trip law).
    pub loaded: bool,
}
