use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-call generation parameters passed to `Model::generate`/`stream`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
}

/// The result of a non-streaming `generate` call (spec §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResult {
    pub text: String,
    pub token_count: Option<u32>,
    #[serde(default)]
    pub raw_provider_metadata: HashMap<String, serde_json::Value>,
}

impl GenerateResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), token_count: None, raw_provider_metadata: HashMap::new() }
    }
}
