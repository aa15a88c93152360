use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::ModelId;

/// Capabilities a `Model` may declare (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Completion,
    Chat,
    Streaming,
    Batching,
    Quantization,
    Embedding,
    FunctionCalling,
    Vision,
    Audio,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::Completion,
        Capability::Chat,
        Capability::Streaming,
        Capability::Batching,
        Capability::Quantization,
        Capability::Embedding,
        Capability::FunctionCalling,
        Capability::Vision,
        Capability::Audio,
    ];
}

/// Execution engine a model runs under, used by the cost scorer's
/// compute-cost table (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionEngine {
    WebGpu,
    Wasm,
    Node,
    Edge,
    Cloud,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        ExecutionEngine::Cloud
    }
}

/// Requirements a candidate model must satisfy, plus generation parameters
/// (spec §6 Request.requirements).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    /// Capabilities that must all be supported by the selected model.
    #[serde(default)]
    pub capabilities: HashSet<Capability>,
    /// An explicit format tag the selected model's format must match.
    pub format: Option<String>,
    /// Maximum parameter count (inclusive) the selected model may have.
    pub max_size: Option<u64>,
    /// A tenant- or caller-scoped preferred model hint.
    pub preferred_model: Option<ModelId>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// A template containing a literal `{prompt}` placeholder.
    pub template: Option<String>,
    pub system_prompt: Option<String>,
}

/// The execution mode a caller declares for a request (spec §6 Request.context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    Realtime,
    Normal,
    Batch,
}

impl Default for RequestMode {
    fn default() -> Self {
        RequestMode::Normal
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub mode: Option<RequestMode>,
    /// Arbitrary targeting attributes consulted by A/B targeting rules and
    /// weighted-splitting segment adjustment (spec §4.8).
    #[serde(default)]
    pub attributes: std::collections::HashMap<String, serde_json::Value>,
}

/// A transport-agnostic inference request (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub prompt: String,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub context: RequestContext,
    /// Ordered alternative model ids tried on non-policy failure (spec §4.9).
    #[serde(default)]
    pub fallback_chain: Vec<ModelId>,
}

impl InferenceRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            requirements: Requirements::default(),
            context: RequestContext::default(),
            fallback_chain: Vec::new(),
        }
    }
}

/// A normalized, non-streaming inference result (spec §6 Response).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub text: String,
    pub tokens: Option<u32>,
    pub model_id: ModelId,
    pub duration_ms: u64,
    pub cached: bool,
    pub fallbacks_used: u32,
}

/// One chunk of a streamed response (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    pub text: String,
    pub finished: bool,
    pub error: Option<String>,
    /// Present only on the terminator chunk.
    pub full_response_length: Option<usize>,
}

impl StreamChunk {
    pub fn fragment(text: impl Into<String>) -> Self {
        Self { text: text.into(), finished: false, error: None, full_response_length: None }
    }

    pub fn terminator(full_response_length: usize) -> Self {
        Self { text: String::new(), finished: true, error: None, full_response_length: Some(full_response_length) }
    }

    pub fn aborted(error: impl Into<String>) -> Self {
        Self { text: String::new(), finished: true, error: Some(error.into()), full_response_length: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_request_defaults_are_empty() {
        let req = InferenceRequest::new("hello");
        assert_eq!(req.prompt, "hello");
        assert!(req.requirements.capabilities.is_empty());
        assert!(req.fallback_chain.is_empty());
    }

    #[test]
    fn stream_chunk_terminator_carries_length() {
        let chunk = StreamChunk::terminator(42);
        assert!(chunk.finished);
        assert_eq!(chunk.full_response_length, Some(42));
        assert!(chunk.error.is_none());
    }

    #[test]
    fn stream_chunk_aborted_is_finished_with_error() {
        let chunk = StreamChunk::aborted("upstream disconnected");
        assert!(chunk.finished);
        assert_eq!(chunk.error.as_deref(), Some("upstream disconnected"));
    }
}
