use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling usage metrics for a single model (spec §3).
///
/// Every field except `avg_latency_ms` is monotonically non-decreasing;
/// `avg_latency_ms` is recomputed as a running mean on each observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub load_time_ms: Option<u64>,
    pub inference_count: u64,
    pub total_tokens: u64,
    pub avg_latency_ms: f64,
    pub last_used: Option<DateTime<Utc>>,
    pub concurrent_in_flight: u32,
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self {
            load_time_ms: None,
            inference_count: 0,
            total_tokens: 0,
            avg_latency_ms: 0.0,
            last_used: None,
            concurrent_in_flight: 0,
        }
    }
}

impl ModelMetrics {
    pub fn record_load(&mut self, elapsed_ms: u64) {
        self.load_time_ms = Some(elapsed_ms);
    }

    /// Folds a completed inference into the rolling metrics (spec §4.1
    /// `updateMetrics`). `started_at` marks when the request entered the
    /// model; `latency_ms` is the observed wall time; `tokens_produced` adds
    /// to the running total.
    pub fn record_inference(&mut self, latency_ms: u64, tokens_produced: u64, now: DateTime<Utc>) {
        let n = self.inference_count;
        let new_n = n + 1;
        self.avg_latency_ms = (self.avg_latency_ms * n as f64 + latency_ms as f64) / new_n as f64;
        self.inference_count = new_n;
        self.total_tokens += tokens_produced;
        self.last_used = Some(now);
    }

    /// Updates `last_used` without counting an inference, used by the
    /// Registry's `get()` to keep LRU ordering accurate even for requests
    /// the model itself never sees (e.g. a lookup that hits the response
    /// cache downstream).
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_used = Some(now);
    }

    pub fn enter_flight(&mut self) {
        self.concurrent_in_flight += 1;
    }

    pub fn exit_flight(&mut self) {
        self.concurrent_in_flight = self.concurrent_in_flight.saturating_sub(1);
    }
}
