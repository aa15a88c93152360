use std::sync::RwLock;

use chrono::Utc;

use crate::metrics::ModelMetrics;
use crate::state::ModelState;

/// Shared state/metrics bookkeeping embedded by concrete `Model`
/// implementations so every backend gets the same lifecycle and rolling
/// metrics semantics for free (spec §4.1).
pub struct ModelHandle {
    state: RwLock<ModelState>,
    metrics: RwLock<ModelMetrics>,
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self { state: RwLock::new(ModelState::Unloaded), metrics: RwLock::new(ModelMetrics::default()) }
    }
}

impl ModelHandle {
    pub fn state(&self) -> ModelState {
        self.state.read().expect("model state lock poisoned").clone()
    }

    pub fn metrics(&self) -> ModelMetrics {
        self.metrics.read().expect("model metrics lock poisoned").clone()
    }

    pub fn set_state(&self, state: ModelState) {
        *self.state.write().expect("model state lock poisoned") = state;
    }

    /// Returns `true` if the caller should proceed to actually load (the
    /// handle was not already `Loaded`), transitioning to `Loading` first.
    /// Makes `load()` idempotent once `Loaded` (spec §4.1).
    pub fn begin_load(&self) -> bool {
        let mut state = self.state.write().expect("model state lock poisoned");
        if matches!(*state, ModelState::Loaded) {
            return false;
        }
        *state = ModelState::Loading;
        true
    }

    pub fn finish_load(&self, elapsed_ms: u64) {
        self.metrics.write().expect("model metrics lock poisoned").record_load(elapsed_ms);
        *self.state.write().expect("model state lock poisoned") = ModelState::Loaded;
    }

    pub fn fail_load(&self, reason: impl Into<String>) {
        *self.state.write().expect("model state lock poisoned") = ModelState::Failed(reason.into());
    }

    pub fn record_inference(&self, latency_ms: u64, tokens_produced: u64) {
        self.metrics.write().expect("model metrics lock poisoned").record_inference(latency_ms, tokens_produced, Utc::now());
    }

    pub fn touch(&self) {
        self.metrics.write().expect("model metrics lock poisoned").touch(Utc::now());
    }

    pub fn enter_flight(&self) {
        self.metrics.write().expect("model metrics lock poisoned").enter_flight();
    }

    pub fn exit_flight(&self) {
        self.metrics.write().expect("model metrics lock poisoned").exit_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_is_idempotent_once_loaded() {
        let handle = ModelHandle::default();
        assert!(handle.begin_load());
        handle.finish_load(5);
        assert!(!handle.begin_load());
        assert!(handle.state().is_loaded());
    }

    #[test]
    fn failed_load_is_recorded() {
        let handle = ModelHandle::default();
        assert!(handle.begin_load());
        handle.fail_load("weights corrupt");
        assert!(handle.state().is_failed());
        // A failed handle is eligible to retry loading.
        assert!(handle.begin_load());
    }
}
