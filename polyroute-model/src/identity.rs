use polyroute_core::{Capability, ModelId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Immutable identity and declared parameters of a loadable model (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelIdentity {
    pub id: ModelId,
    pub name: String,
    pub version: String,
    pub format: String,
    pub architecture: String,
    /// Declared parameter count, e.g. `7_000_000_000` for a 7B model.
    pub parameter_count: u64,
    pub context_window: u32,
    pub quantization: Option<String>,
    pub capabilities: HashSet<Capability>,
    /// Declared execution engine, consulted by the cost scorer.
    pub engine: polyroute_core::ExecutionEngine,
    /// Approximate on-disk/in-memory footprint in gigabytes, used by the
    /// cost scorer's compute-cost term.
    pub size_gb: f64,
}

impl ModelIdentity {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
