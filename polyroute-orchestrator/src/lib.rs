//! Per-request composition of tenancy checks, A/B assignment, routing, and
//! pipeline execution, with caller-provided fallback chains and
//! per-`(tenant, error-class)` circuit breaking (spec §4.9).

mod circuit_breaker;
mod fallback;
mod orchestrator;
mod overrides;

pub use circuit_breaker::CircuitBreaker;
pub use fallback::FallbackEntry;
pub use orchestrator::{Orchestrator, OrchestratorRequest};
pub use overrides::apply_variant_overrides;
