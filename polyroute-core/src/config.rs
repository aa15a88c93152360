//! Typed configuration structs for each subsystem (spec §6 ambient config).
//!
//! These types only describe in-memory defaults and validation; reading them
//! from a file or environment is out of scope (spec §1 Non-goals) and left to
//! the embedding application.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of simultaneously loaded models before LRU eviction.
    pub max_loaded_models: usize,
    /// Directory snapshot saves are written to, if snapshotting is enabled.
    pub snapshot_dir: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { max_loaded_models: 100, snapshot_dir: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Route-cache entry time-to-live.
    pub cache_ttl_ms: u64,
    /// Maximum number of cached routing decisions retained at once.
    pub cache_capacity: usize,
    /// Interval between background purges of expired cache entries.
    pub purge_interval_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { cache_ttl_ms: 3_600_000, cache_capacity: 10_000, purge_interval_ms: 60_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_retries: u32,
    /// Base delay doubled per attempt in the retry backoff schedule:
    /// `delay = min(base_backoff_ms * 2^attempt, max_backoff_ms)`.
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub response_cache_ttl_ms: u64,
    pub response_cache_capacity: usize,
    /// Budget after which an in-flight request is abandoned with `Timeout`.
    pub request_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 1_000,
            max_backoff_ms: 5_000,
            response_cache_ttl_ms: 3_600_000,
            response_cache_capacity: 5_000,
            request_timeout_ms: 30_000,
        }
    }
}

/// Per-unit billing rates consulted by `recordUsage` when billing is
/// enabled. The core only multiplies; the rates themselves are
/// externally-supplied configuration (spec §9 design notes) — pricing
/// policy is a consumer concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingRates {
    pub per_request: f64,
    pub per_token: f64,
    pub per_compute_unit: f64,
}

impl Default for BillingRates {
    fn default() -> Self {
        Self { per_request: 0.001, per_token: 0.00002, per_compute_unit: 0.01 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TenancyConfig {
    /// How long usage history is retained before pruning (spec §4.7).
    pub usage_history_retention_ms: u64,
    pub enable_billing: bool,
    pub billing_rates: BillingRates,
    /// How long billing events are retained before pruning (spec §3 Billing
    /// Event: "retained ≤ 30 days in-memory").
    pub billing_retention_ms: u64,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            usage_history_retention_ms: 86_400_000,
            enable_billing: true,
            billing_rates: BillingRates::default(),
            billing_retention_ms: 30 * 86_400_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ABTestConfig {
    /// Maximum number of concurrently `Running` experiments per tenant.
    pub max_active_experiments: usize,
}

impl Default for ABTestConfig {
    fn default() -> Self {
        Self { max_active_experiments: 10 }
    }
}

/// Umbrella configuration aggregating every subsystem's settings, the way an
/// embedding application would construct and pass down a single value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyrouteConfig {
    pub registry: RegistryConfig,
    pub router: RouterConfig,
    pub pipeline: PipelineConfig,
    pub tenancy: TenancyConfig,
    pub abtest: ABTestConfig,
}
