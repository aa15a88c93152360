use std::collections::HashSet;
use std::sync::Arc;

use polyroute_core::Capability;
use polyroute_model::{Model, ModelState};

/// Predicate bundle consumed by `Registry::list` (spec §4.3).
#[derive(Default)]
pub struct ListFilter {
    pub formats: Option<HashSet<String>>,
    pub capabilities: Option<HashSet<Capability>>,
    pub state: Option<ModelState>,
    pub predicate: Option<Box<dyn Fn(&dyn Model) -> bool + Send + Sync>>,
    pub limit: Option<usize>,
}

impl ListFilter {
    pub fn matches(&self, model: &dyn Model) -> bool {
        if let Some(formats) = &self.formats {
            if !formats.contains(&model.identity().format) {
                return false;
            }
        }
        if let Some(capabilities) = &self.capabilities {
            if !capabilities.iter().all(|c| model.supports(*c)) {
                return false;
            }
        }
        if let Some(state) = &self.state {
            if &model.state() != state {
                return false;
            }
        }
        if let Some(predicate) = &self.predicate {
            if !predicate(model) {
                return false;
            }
        }
        true
    }
}

pub(crate) fn apply_limit(models: Vec<Arc<dyn Model>>, limit: Option<usize>) -> Vec<Arc<dyn Model>> {
    match limit {
        Some(n) => models.into_iter().take(n).collect(),
        None => models,
    }
}
