use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use polyroute_core::TenantId;
use tokio::sync::RwLock;

/// Failures in this trailing window count toward tripping the breaker
/// (spec §4.9 step 7: "5-minute window").
const FAILURE_WINDOW_SECS: i64 = 300;
/// Recommended threshold from the spec ("recommend N = 5").
const FAILURE_THRESHOLD: usize = 5;
/// How long a tripped breaker stays open before a probe attempt is allowed.
const COOLDOWN_SECS: i64 = 60;

#[derive(Debug, Default)]
struct BreakerState {
    failures: VecDeque<DateTime<Utc>>,
    opened_at: Option<DateTime<Utc>>,
}

/// Per `(tenant, error-class)` circuit breaker (spec §4.9 step 7). Trips
/// after `FAILURE_THRESHOLD` failures inside `FAILURE_WINDOW_SECS`, then
/// rejects attempts until `COOLDOWN_SECS` has elapsed.
#[derive(Default)]
pub struct CircuitBreaker {
    state: Arc<RwLock<HashMap<(TenantId, &'static str), BreakerState>>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_open(&self, tenant_id: &TenantId, error_class: &'static str) -> bool {
        let state = self.state.read().await;
        match state.get(&(tenant_id.clone(), error_class)) {
            Some(entry) => match entry.opened_at {
                Some(opened_at) => Utc::now() - opened_at < Duration::seconds(COOLDOWN_SECS),
                None => false,
            },
            None => false,
        }
    }

    /// True if any error class is currently tripped for this tenant, and if
    /// so, which one. A caller about to attempt a candidate cannot know
    /// which error class that attempt might fail with, so admission must
    /// check every class previously tripped for the tenant rather than a
    /// single assumed class.
    pub async fn is_open_for_tenant(&self, tenant_id: &TenantId) -> Option<&'static str> {
        let state = self.state.read().await;
        let now = Utc::now();
        state.iter().find_map(|((t, class), entry)| {
            if t != tenant_id {
                return None;
            }
            match entry.opened_at {
                Some(opened_at) if now - opened_at < Duration::seconds(COOLDOWN_SECS) => Some(*class),
                _ => None,
            }
        })
    }

    /// Records a failure and trips the breaker if the trailing-window count
    /// now meets the threshold. Returns whether the breaker is open after
    /// this call.
    pub async fn record_failure(&self, tenant_id: &TenantId, error_class: &'static str) -> bool {
        let mut state = self.state.write().await;
        let entry = state.entry((tenant_id.clone(), error_class)).or_default();
        let now = Utc::now();
        entry.failures.push_back(now);
        let cutoff = now - Duration::seconds(FAILURE_WINDOW_SECS);
        while let Some(front) = entry.failures.front() {
            if *front < cutoff {
                entry.failures.pop_front();
            } else {
                break;
            }
        }
        if entry.failures.len() >= FAILURE_THRESHOLD {
            entry.opened_at = Some(now);
        }
        entry.opened_at.is_some() && now - entry.opened_at.unwrap() < Duration::seconds(COOLDOWN_SECS)
    }

    /// Clears tripped state for one error class, the way a successful probe
    /// attempt after cooldown would reset the breaker.
    pub async fn record_success(&self, tenant_id: &TenantId, error_class: &'static str) {
        let mut state = self.state.write().await;
        state.remove(&(tenant_id.clone(), error_class));
    }

    /// Clears tripped state across every error class for this tenant. A
    /// successful attempt proves the tenant's traffic is flowing again
    /// regardless of which class had tripped the breaker.
    pub async fn reset_tenant(&self, tenant_id: &TenantId) {
        let mut state = self.state.write().await;
        state.retain(|(t, _), _| t != tenant_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trips_after_threshold_failures() {
        let breaker = CircuitBreaker::new();
        let tenant = TenantId::new("t1");
        for _ in 0..4 {
            assert!(!breaker.record_failure(&tenant, "UpstreamError").await);
        }
        assert!(breaker.record_failure(&tenant, "UpstreamError").await);
        assert!(breaker.is_open(&tenant, "UpstreamError").await);
    }

    #[tokio::test]
    async fn distinct_error_classes_are_independent() {
        let breaker = CircuitBreaker::new();
        let tenant = TenantId::new("t1");
        for _ in 0..5 {
            breaker.record_failure(&tenant, "UpstreamError").await;
        }
        assert!(!breaker.is_open(&tenant, "RateLimited").await);
    }

    #[tokio::test]
    async fn is_open_for_tenant_finds_a_trip_under_any_error_class() {
        let breaker = CircuitBreaker::new();
        let tenant = TenantId::new("t1");
        assert!(breaker.is_open_for_tenant(&tenant).await.is_none());
        for _ in 0..5 {
            breaker.record_failure(&tenant, "Timeout").await;
        }
        assert_eq!(breaker.is_open_for_tenant(&tenant).await, Some("Timeout"));
        assert!(!breaker.is_open(&tenant, "UpstreamError").await);
    }

    #[tokio::test]
    async fn reset_tenant_clears_every_error_class() {
        let breaker = CircuitBreaker::new();
        let tenant = TenantId::new("t1");
        for _ in 0..5 {
            breaker.record_failure(&tenant, "Timeout").await;
            breaker.record_failure(&tenant, "RateLimited").await;
        }
        assert!(breaker.is_open_for_tenant(&tenant).await.is_some());
        breaker.reset_tenant(&tenant).await;
        assert!(breaker.is_open_for_tenant(&tenant).await.is_none());
    }

    #[tokio::test]
    async fn success_resets_the_breaker() {
        let breaker = CircuitBreaker::new();
        let tenant = TenantId::new("t1");
        for _ in 0..5 {
            breaker.record_failure(&tenant, "UpstreamError").await;
        }
        breaker.record_success(&tenant, "UpstreamError").await;
        assert!(!breaker.is_open(&tenant, "UpstreamError").await);
    }
}
