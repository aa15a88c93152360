use serde::{Deserialize, Serialize};

/// One outcome of a `Pipeline::process` cache lookup, recorded for later
/// analysis.
#[derive(Debug, Clone, Copy)]
pub struct CacheEvent {
    pub hit: bool,
    pub tokens: u32,
}

/// Metrics computed from a run of response-cache lookups.
///
/// All ratio fields are percentages in the range `[0.0, 100.0]`. When there
/// are no recorded events, every field is zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheMetrics {
    pub total_requests: u32,
    pub cache_hits: u32,
    pub total_tokens_served: u64,
    pub tokens_served_from_cache: u64,
    /// `cache_hits / total_requests * 100`.
    pub hit_ratio: f64,
    /// `tokens_served_from_cache / total_tokens_served * 100`.
    pub token_savings_ratio: f64,
}

/// Stateless analyzer — call [`CachePerformanceAnalyzer::analyze`] with any
/// slice of [`CacheEvent`]s to get a [`CacheMetrics`] snapshot.
pub struct CachePerformanceAnalyzer;

impl CachePerformanceAnalyzer {
    pub fn analyze(events: &[CacheEvent]) -> CacheMetrics {
        let mut metrics = CacheMetrics::default();

        for event in events {
            metrics.total_requests += 1;
            metrics.total_tokens_served += event.tokens as u64;
            if event.hit {
                metrics.cache_hits += 1;
                metrics.tokens_served_from_cache += event.tokens as u64;
            }
        }

        if metrics.total_requests > 0 {
            metrics.hit_ratio = metrics.cache_hits as f64 / metrics.total_requests as f64 * 100.0;
        }
        if metrics.total_tokens_served > 0 {
            metrics.token_savings_ratio =
                metrics.tokens_served_from_cache as f64 / metrics.total_tokens_served as f64 * 100.0;
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_events_yield_zeroed_metrics() {
        let metrics = CachePerformanceAnalyzer::analyze(&[]);
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.hit_ratio, 0.0);
    }

    #[test]
    fn hit_ratio_and_token_savings_are_computed() {
        let events = vec![
            CacheEvent { hit: true, tokens: 100 },
            CacheEvent { hit: false, tokens: 100 },
            CacheEvent { hit: true, tokens: 50 },
        ];
        let metrics = CachePerformanceAnalyzer::analyze(&events);
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.cache_hits, 2);
        assert!((metrics.hit_ratio - 66.666).abs() < 0.01);
        assert_eq!(metrics.tokens_served_from_cache, 150);
        assert_eq!(metrics.total_tokens_served, 250);
    }
}
