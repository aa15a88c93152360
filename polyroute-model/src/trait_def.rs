use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;
use polyroute_core::{Capability, Result};

use crate::identity::ModelIdentity;
use crate::metrics::ModelMetrics;
use crate::options::{GenerateOptions, GenerateResult};
use crate::state::ModelState;

/// A lazy, finite sequence of stream fragments. Matches the teacher's
/// `LlmResponseStream` pattern: a boxed, pinned, send-able async stream so
/// callers don't need to know the concrete provider implementation.
pub type GenerateStream = Pin<Box<dyn Stream<Item = Result<StreamFragment>> + Send>>;

/// One item of a `Model::stream` sequence.
#[derive(Debug, Clone)]
pub struct StreamFragment {
    pub text: String,
    pub token_count: Option<u32>,
}

/// The uniform handle every backend — local weight file or remote HTTP API —
/// is abstracted behind (spec §4.1).
///
/// Implementations never silently swallow an internal failure: every error
/// path surfaces one of [`polyroute_core::Error`]'s typed variants. Stream
/// termination distinguishes a completed sequence from an aborted one by
/// yielding an `Err` as the stream's final item rather than simply ending.
#[async_trait]
pub trait Model: Send + Sync {
    fn identity(&self) -> &ModelIdentity;

    fn state(&self) -> ModelState;

    fn metrics(&self) -> ModelMetrics;

    /// Marks the model as just-accessed for LRU purposes, independent of
    /// whether an inference actually ran (e.g. a Registry `get()` that ends
    /// up serving a downstream cache hit). Default is a no-op for
    /// implementations that don't track `lastUsed` themselves.
    fn touch(&self) {}

    /// Transitions `Unloaded|Failed -> Loading -> Loaded|Failed`. Idempotent
    /// once `Loaded`.
    async fn load(&self) -> Result<()>;

    /// Releases resources; subsequent `generate`/`stream` calls fail with
    /// `NotLoaded`.
    async fn unload(&self) -> Result<()>;

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<GenerateResult>;

    /// Must call a finalizer even on abort — implementations achieve this by
    /// yielding a terminal `Err` item rather than dropping the stream silently.
    async fn stream(&self, prompt: &str, options: &GenerateOptions) -> Result<GenerateStream>;

    /// Only required if `supports(Capability::Embedding)`.
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(polyroute_core::Error::InvalidRequest { reason: "model does not support embedding".into() })
    }

    /// Only required if the model declares tokenization support via its
    /// format/architecture; not gated by a dedicated `Capability` variant.
    async fn tokenize(&self, _text: &str) -> Result<Vec<u32>> {
        Err(polyroute_core::Error::InvalidRequest { reason: "model does not support tokenization".into() })
    }

    async fn detokenize(&self, _tokens: &[u32]) -> Result<String> {
        Err(polyroute_core::Error::InvalidRequest { reason: "model does not support tokenization".into() })
    }

    fn supports(&self, capability: Capability) -> bool {
        self.identity().supports(capability)
    }
}
