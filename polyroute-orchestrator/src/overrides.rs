use std::collections::HashMap;

use polyroute_core::{ModelId, Requirements};
use serde_json::Value;

/// Merges an assigned A/B variant's parameter overrides into a request's
/// requirements before it reaches the Router (spec §4.8 "Effect on
/// routing"). Unrecognized keys are ignored rather than rejected — variant
/// overrides are an open-ended bag, and an unknown key is not a caller
/// error.
pub fn apply_variant_overrides(requirements: &Requirements, overrides: &HashMap<String, Value>) -> Requirements {
    let mut out = requirements.clone();
    if let Some(v) = overrides.get("max_tokens").and_then(Value::as_u64) {
        out.max_tokens = Some(v as u32);
    }
    if let Some(v) = overrides.get("temperature").and_then(Value::as_f64) {
        out.temperature = Some(v as f32);
    }
    if let Some(v) = overrides.get("template").and_then(Value::as_str) {
        out.template = Some(v.to_string());
    }
    if let Some(v) = overrides.get("system_prompt").and_then(Value::as_str) {
        out.system_prompt = Some(v.to_string());
    }
    if let Some(v) = overrides.get("preferred_model").and_then(Value::as_str) {
        out.preferred_model = Some(ModelId::new(v));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn applies_recognized_override_keys() {
        let base = Requirements::default();
        let mut overrides = HashMap::new();
        overrides.insert("max_tokens".to_string(), json!(256));
        overrides.insert("temperature".to_string(), json!(0.2));
        let merged = apply_variant_overrides(&base, &overrides);
        assert_eq!(merged.max_tokens, Some(256));
        assert_eq!(merged.temperature, Some(0.2));
    }

    #[test]
    fn ignores_unknown_keys() {
        let base = Requirements::default();
        let mut overrides = HashMap::new();
        overrides.insert("unknown_knob".to_string(), json!("whatever"));
        let merged = apply_variant_overrides(&base, &overrides);
        assert_eq!(merged.max_tokens, None);
    }
}
