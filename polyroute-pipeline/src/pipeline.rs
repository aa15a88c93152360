use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use polyroute_core::{Error, InferenceResponse, PipelineConfig, Requirements, Result};
use polyroute_model::{GenerateOptions, Model};
use tracing::info;

use crate::preprocess::preprocess_prompt;
use crate::response_cache::{response_cache_key, ResponseCache};
use crate::retry::retry_with_backoff;
use crate::stream_adapter::adapt_stream;

/// Pre/post-processing, retry-with-backoff, response caching, and streaming
/// adaptation around a selected Model (spec §4.6).
pub struct Pipeline {
    config: PipelineConfig,
    response_cache: ResponseCache,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let response_cache = ResponseCache::new(config.response_cache_ttl_ms, config.response_cache_capacity);
        Self { config, response_cache }
    }

    fn options_from(&self, requirements: &Requirements) -> GenerateOptions {
        GenerateOptions { max_tokens: requirements.max_tokens, temperature: requirements.temperature, system_prompt: None }
    }

    /// Runs the full `process` operation (spec §4.6 steps 1–7).
    pub async fn process(
        &self,
        model: Arc<dyn Model>,
        prompt: &str,
        requirements: &Requirements,
        use_cache: bool,
    ) -> Result<InferenceResponse> {
        let started = Instant::now();
        let model_id = model.identity().id.clone();
        let key = response_cache_key(&model_id, prompt, requirements);

        if use_cache {
            if let Some(cached) = self.response_cache.get(&key) {
                return Ok(InferenceResponse {
                    text: cached.text,
                    tokens: cached.token_count,
                    model_id,
                    duration_ms: started.elapsed().as_millis() as u64,
                    cached: true,
                    fallbacks_used: 0,
                });
            }
        }

        let final_prompt = preprocess_prompt(prompt, requirements);
        let options = self.options_from(requirements);

        let budget = Duration::from_millis(self.config.request_timeout_ms);
        let deadline = Instant::now() + budget;
        let retries = tokio::time::timeout(
            budget,
            retry_with_backoff(self.config.max_retries, self.config.base_backoff_ms, self.config.max_backoff_ms, deadline, || {
                model.generate(&final_prompt, &options)
            }),
        )
        .await;
        let result = match retries {
            Ok(inner) => inner?,
            Err(_) => {
                return Err(Error::Timeout {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    budget_ms: self.config.request_timeout_ms,
                })
            }
        };

        if use_cache {
            self.response_cache.insert(key, result.clone());
        }

        info!(model_id = %model_id, duration_ms = started.elapsed().as_millis() as u64, "processed");

        Ok(InferenceResponse {
            text: result.text,
            tokens: result.token_count,
            model_id,
            duration_ms: started.elapsed().as_millis() as u64,
            cached: false,
            fallbacks_used: 0,
        })
    }

    /// Runs the `stream` operation (spec §4.6 "stream"). The returned
    /// sequence is finite, non-restartable, and always completes with a
    /// `finished: true` terminator even on abort.
    pub async fn stream(
        &self,
        model: Arc<dyn Model>,
        prompt: &str,
        requirements: &Requirements,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<polyroute_core::StreamChunk>> + Send>>> {
        let final_prompt = preprocess_prompt(prompt, requirements);
        let options = self.options_from(requirements);
        let inner = model.stream(&final_prompt, &options).await?;
        Ok(adapt_stream(inner))
    }

    pub fn response_cache_len(&self) -> usize {
        self.response_cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use polyroute_core::{Capability, ExecutionEngine, ModelId};
    use polyroute_model::mock::MockModel;
    use polyroute_model::ModelIdentity;
    use std::collections::HashSet;

    fn identity(id: &str) -> ModelIdentity {
        ModelIdentity {
            id: ModelId::new(id),
            name: id.to_string(),
            version: "1.0".into(),
            format: "mock".into(),
            architecture: "mock".into(),
            parameter_count: 1_000_000,
            context_window: 4096,
            quantization: None,
            capabilities: HashSet::from([Capability::Completion, Capability::Streaming]),
            engine: ExecutionEngine::Cloud,
            size_gb: 0.1,
        }
    }

    #[tokio::test]
    async fn process_caches_and_the_second_call_skips_generate() {
        let model: Arc<dyn Model> = Arc::new(MockModel::new(identity("a")).with_response("hello"));
        model.load().await.unwrap();
        let pipeline = Pipeline::new(PipelineConfig::default());

        let requirements = Requirements::default();
        let first = pipeline.process(model.clone(), "hi", &requirements, true).await.unwrap();
        assert!(!first.cached);
        let second = pipeline.process(model.clone(), "hi", &requirements, true).await.unwrap();
        assert!(second.cached);
        assert_eq!(first.text, second.text);
    }

    #[tokio::test]
    async fn process_retries_then_falls_back_to_error_after_exhausting_budget() {
        let model: Arc<dyn Model> = Arc::new(MockModel::new(identity("a")).failing());
        model.load().await.unwrap();
        let config = PipelineConfig { max_retries: 1, base_backoff_ms: 1, max_backoff_ms: 5, ..Default::default() };
        let pipeline = Pipeline::new(config);
        let err = pipeline.process(model, "hi", &Requirements::default(), false).await.unwrap_err();
        assert_eq!(err.kind(), "UpstreamError");
    }

    #[tokio::test]
    async fn process_times_out_when_the_model_exceeds_the_request_deadline() {
        use std::time::Duration as StdDuration;
        let model: Arc<dyn Model> =
            Arc::new(MockModel::new(identity("a")).with_delay(StdDuration::from_millis(50)));
        model.load().await.unwrap();
        let config = PipelineConfig { request_timeout_ms: 10, max_retries: 0, ..Default::default() };
        let pipeline = Pipeline::new(config);
        let err = pipeline.process(model, "hi", &Requirements::default(), false).await.unwrap_err();
        assert_eq!(err.kind(), "Timeout");
    }

    #[tokio::test]
    async fn stream_ends_with_a_finished_terminator() {
        let model: Arc<dyn Model> = Arc::new(MockModel::new(identity("a")).with_response("a b c"));
        model.load().await.unwrap();
        let pipeline = Pipeline::new(PipelineConfig::default());
        let mut stream = pipeline.stream(model, "hi", &Requirements::default()).await.unwrap();
        let mut chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            chunks.push(chunk.unwrap());
        }
        assert!(chunks.last().unwrap().finished);
    }
}
