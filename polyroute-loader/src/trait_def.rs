use std::sync::Arc;

use async_trait::async_trait;
use polyroute_core::Result;
use polyroute_model::Model;

use crate::spec::{ModelDescriptor, ModelSpec};

/// A format-specific factory (spec §4.2). The Registry keeps at most one
/// `Loader` per format tag (`format()`); registering a second loader under
/// the same tag overrides the prior one.
#[async_trait]
pub trait Loader: Send + Sync {
    fn format(&self) -> &str;

    async fn load(&self, spec: &ModelSpec) -> Result<Arc<dyn Model>>;

    async fn from_snapshot(&self, descriptor: &ModelDescriptor) -> Result<Arc<dyn Model>>;
}
