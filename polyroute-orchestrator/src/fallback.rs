use polyroute_core::{ModelId, Requirements};

/// One entry in a caller-provided fallback chain (spec §4.9 step 7): retries
/// selection from step 4 with either a specific model id or a relaxed
/// requirement set.
#[derive(Debug, Clone, Default)]
pub struct FallbackEntry {
    pub model_id: Option<ModelId>,
    pub requirements: Option<Requirements>,
}

impl FallbackEntry {
    pub fn with_model(model_id: ModelId) -> Self {
        Self { model_id: Some(model_id), requirements: None }
    }

    pub fn with_requirements(requirements: Requirements) -> Self {
        Self { model_id: None, requirements: Some(requirements) }
    }

    /// The `Requirements` to re-select with, derived from this entry layered
    /// over the request's original requirements.
    pub fn resolve(&self, original: &Requirements) -> Requirements {
        let mut next = self.requirements.clone().unwrap_or_else(|| original.clone());
        if let Some(model_id) = &self.model_id {
            next.preferred_model = Some(model_id.clone());
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_model_overrides_preferred_model_only() {
        let original = Requirements { max_tokens: Some(10), ..Default::default() };
        let entry = FallbackEntry::with_model(ModelId::new("m2"));
        let resolved = entry.resolve(&original);
        assert_eq!(resolved.preferred_model, Some(ModelId::new("m2")));
        assert_eq!(resolved.max_tokens, Some(10));
    }

    #[test]
    fn with_requirements_replaces_the_whole_set() {
        let original = Requirements { max_tokens: Some(10), ..Default::default() };
        let replacement = Requirements { max_tokens: Some(99), ..Default::default() };
        let entry = FallbackEntry::with_requirements(replacement);
        let resolved = entry.resolve(&original);
        assert_eq!(resolved.max_tokens, Some(99));
    }
}
