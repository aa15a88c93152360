//! Shared types, error taxonomy, and configuration for the polyroute
//! multi-provider LLM router.
//!
//! Every other `polyroute-*` crate depends on this one for its identifiers,
//! error type, and request/response shapes.

mod config;
mod error;
mod ids;
mod quota;
mod types;

pub use config::{
    ABTestConfig, BillingRates, PipelineConfig, PolyrouteConfig, RegistryConfig, RouterConfig, TenancyConfig,
};
pub use error::{Error, Result};
pub use ids::{ExperimentId, ModelId, RequestId, TenantId, UserId};
pub use quota::QuotaKind;
pub use types::{
    Capability, ExecutionEngine, InferenceRequest, InferenceResponse, RequestContext, RequestMode, Requirements,
    StreamChunk,
};
