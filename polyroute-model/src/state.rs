use serde::{Deserialize, Serialize};

/// A model's runtime lifecycle state (spec §3).
///
/// Transitions: `Unloaded|Failed -> Loading -> Loaded|Failed`. `load()` is
/// idempotent once `Loaded`; it returns immediately without re-entering
/// `Loading`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelState {
    Unloaded,
    Loading,
    Loaded,
    Failed(String),
}

impl ModelState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ModelState::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_reports_is_loaded() {
        assert!(ModelState::Loaded.is_loaded());
        assert!(!ModelState::Unloaded.is_loaded());
    }

    #[test]
    fn failed_carries_message() {
        let state = ModelState::Failed("boom".into());
        assert!(state.is_failed());
    }
}
