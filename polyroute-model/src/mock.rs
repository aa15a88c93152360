//! An in-memory `Model` fixture used by this crate's own tests and by the
//! downstream registry/router/pipeline crates to exercise selection and
//! execution logic without a real provider.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use polyroute_core::{Error, Result};

use crate::handle::ModelHandle;
use crate::identity::ModelIdentity;
use crate::metrics::ModelMetrics;
use crate::options::{GenerateOptions, GenerateResult};
use crate::state::ModelState;
use crate::trait_def::{GenerateStream, Model, StreamFragment};

pub struct MockModel {
    identity: ModelIdentity,
    handle: ModelHandle,
    /// Canned response text; the prompt is echoed if `None`.
    fixed_response: Option<String>,
    fail_generation: bool,
    /// Artificial latency before `generate` returns, for exercising deadline
    /// enforcement in callers.
    delay: Option<Duration>,
}

impl MockModel {
    pub fn new(identity: ModelIdentity) -> Self {
        Self { identity, handle: ModelHandle::default(), fixed_response: None, fail_generation: false, delay: None }
    }

    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.fixed_response = Some(text.into());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_generation = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Model for MockModel {
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
        self.handle.finish_load(1);
        Ok(())
    }

    async fn unload(&self) -> Result<()> {
        self.handle.set_state(ModelState::Unloaded);
        Ok(())
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<GenerateResult> {
        if !self.handle.state().is_loaded() {
            return Err(Error::NotLoaded { model_id: self.identity.id.to_string() });
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_generation {
            return Err(Error::UpstreamError { reason: "mock upstream failure".into() });
        }
        let text = self.fixed_response.clone().unwrap_or_else(|| format!("echo: {prompt}"));
        let tokens = text.split_whitespace().count() as u64;
        self.handle.record_inference(1, tokens);
        Ok(GenerateResult { text, token_count: Some(tokens as u32), raw_provider_metadata: Default::default() })
    }

    async fn stream(&self, prompt: &str, options: &GenerateOptions) -> Result<GenerateStream> {
        if !self.handle.state().is_loaded() {
            return Err(Error::NotLoaded { model_id: self.identity.id.to_string() });
        }
        let result = self.generate(prompt, options).await?;
        let words: Vec<String> = result.text.split(' ').map(str::to_string).collect();
        let items: Vec<Result<StreamFragment>> =
            words.into_iter().map(|w| Ok(StreamFragment { text: w, token_count: Some(1) })).collect();
        Ok(Box::pin(stream::iter(items)))
    }
}
