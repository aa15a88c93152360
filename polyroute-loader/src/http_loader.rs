use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream;
use polyroute_core::{Capability, Error, ExecutionEngine, ModelId, Result};
use polyroute_model::{
    GenerateOptions, GenerateResult, GenerateStream, Model, ModelHandle, ModelIdentity, ModelMetrics, ModelState,
    StreamFragment,
};
use serde::{Deserialize, Serialize};

use crate::spec::{ModelDescriptor, ModelSpec};
use crate::trait_def::Loader;

/// A minimal JSON request/response contract a remote HTTP completion
/// endpoint is expected to implement. Concrete provider wire formats are out
/// of scope; this is the uniform shape the router talks in.
#[derive(Debug, Serialize)]
struct HttpCompletionRequest<'a> {
    prompt: &'a str,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct HttpCompletionResponse {
    text: String,
    #[serde(default)]
    token_count: Option<u32>,
}

/// A `Model` backed by a remote HTTP endpoint (spec §1: "remote HTTP APIs").
pub struct HttpModel {
    identity: ModelIdentity,
    handle: ModelHandle,
    client: reqwest::Client,
    endpoint: String,
}

impl HttpModel {
    pub fn new(identity: ModelIdentity, endpoint: impl Into<String>) -> Self {
        Self { identity, handle: ModelHandle::default(), client: reqwest::Client::new(), endpoint: endpoint.into() }
    }
}

#[async_trait]
impl Model for HttpModel {
    fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    fn state(&self) -> ModelState {
        self.handle.state()
    }

    fn metrics(&self) -> ModelMetrics {
        self.handle.metrics()
    }

    fn touch(&self) {
        self.handle.touch();
    }

    async fn load(&self) -> Result<()> {
        if !self.handle.begin_load() {
            return Ok(());
        }
        // Remote endpoints need no local warm-up; the connection is lazy.
        self.handle.finish_load(0);
        Ok(())
    }

    async fn unload(&self) -> Result<()> {
        self.handle.set_state(ModelState::Unloaded);
        Ok(())
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<GenerateResult> {
        if !self.handle.state().is_loaded() {
            return Err(Error::NotLoaded { model_id: self.identity.id.to_string() });
        }
        let started = Instant::now();
        let body = HttpCompletionRequest { prompt, max_tokens: options.max_tokens, temperature: options.temperature };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1_000);
            return Err(Error::RateLimited { retry_after_ms });
        }
        if !response.status().is_success() {
            return Err(Error::UpstreamError { reason: format!("status {}", response.status()) });
        }

        let parsed: HttpCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::UpstreamError { reason: format!("malformed response body: {e}") })?;

        let latency_ms = started.elapsed().as_millis() as u64;
        self.handle.record_inference(latency_ms, parsed.token_count.unwrap_or(0) as u64);

        Ok(GenerateResult { text: parsed.text, token_count: parsed.token_count, raw_provider_metadata: Default::default() })
    }

    async fn stream(&self, prompt: &str, options: &GenerateOptions) -> Result<GenerateStream> {
        // A uniform remote streaming wire format is out of scope (spec §1);
        // non-streaming generation is adapted into a single-fragment stream.
        let result = self.generate(prompt, options).await?;
        let fragment = StreamFragment { text: result.text, token_count: result.token_count };
        Ok(Box::pin(stream::iter(vec![Ok(fragment)])))
    }
}

fn classify_reqwest_error(err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout { elapsed_ms: 0, budget_ms: 0 }
    } else {
        Error::UpstreamError { reason: err.to_string() }
    }
}

/// Produces [`HttpModel`]s for any remote-looking format tag (`huggingface`,
/// or a caller-chosen custom tag for a self-hosted endpoint).
pub struct HttpLoader {
    format: String,
}

impl HttpLoader {
    pub fn new(format: impl Into<String>) -> Self {
        Self { format: format.into() }
    }
}

fn identity_from_spec(format: &str, spec: &ModelSpec) -> ModelIdentity {
    let id = spec.id.clone().unwrap_or_else(|| ModelId::new(spec.source.clone()));
    ModelIdentity {
        id,
        name: spec.source.clone(),
        version: spec
            .options
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string(),
        format: format.to_string(),
        architecture: spec
            .options
            .get("architecture")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string(),
        parameter_count: spec.options.get("parameter_count").and_then(|v| v.as_u64()).unwrap_or(0),
        context_window: spec.options.get("context_window").and_then(|v| v.as_u64()).unwrap_or(2048) as u32,
        quantization: spec.options.get("quantization").and_then(|v| v.as_str()).map(str::to_string),
        capabilities: HashSet::from([Capability::Completion, Capability::Chat]),
        engine: ExecutionEngine::Cloud,
        size_gb: spec.options.get("size_gb").and_then(|v| v.as_f64()).unwrap_or(0.0),
    }
}

#[async_trait]
impl Loader for HttpLoader {
    fn format(&self) -> &str {
        &self.format
    }

    async fn load(&self, spec: &ModelSpec) -> Result<Arc<dyn Model>> {
        let identity = identity_from_spec(&self.format, spec);
        Ok(Arc::new(HttpModel::new(identity, spec.source.clone())))
    }

    async fn from_snapshot(&self, descriptor: &ModelDescriptor) -> Result<Arc<dyn Model>> {
        let identity = ModelIdentity {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            format: descriptor.format.clone(),
            architecture: descriptor.architecture.clone(),
            parameter_count: descriptor.parameter_count,
            context_window: descriptor.context_window,
            quantization: descriptor.quantization.clone(),
            capabilities: descriptor.capabilities.iter().copied().collect(),
            engine: descriptor.engine,
            size_gb: descriptor.size_gb,
        };
        Ok(Arc::new(HttpModel::new(identity, descriptor.source.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loader_reports_its_format_tag() {
        let loader = HttpLoader::new("huggingface");
        assert_eq!(loader.format(), "huggingface");
    }

    #[tokio::test]
    async fn generate_fails_before_load() {
        let identity = identity_from_spec("huggingface", &ModelSpec::new("https://example.com/model"));
        let model = HttpModel::new(identity, "https://example.com/generate");
        let err = model.generate("hi", &GenerateOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), "NotLoaded");
    }
}
