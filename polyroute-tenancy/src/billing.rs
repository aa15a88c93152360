use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use polyroute_core::{BillingRates, ModelId, TenantId};
use serde::{Deserialize, Serialize};

/// One `recordUsage` call's billing contribution (spec §3 Billing Event:
/// `{tenant-id, timestamp, requests, tokens, model-id, cost}`). `compute_units`
/// is an addition feeding the `ComputeUnits` quota's own billing weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingEvent {
    pub tenant_id: TenantId,
    pub at: DateTime<Utc>,
    pub requests: i64,
    pub tokens: i64,
    pub compute_units: i64,
    pub model_id: Option<ModelId>,
    pub cost: f64,
}

fn cost_of(rates: &BillingRates, requests: i64, tokens: i64, compute_units: i64) -> f64 {
    requests as f64 * rates.per_request
        + tokens as f64 * rates.per_token
        + compute_units as f64 * rates.per_compute_unit
}

/// A bounded, time-pruned ring buffer of billing events. The core only
/// tags each usage-recording call with a cost computed from a caller
/// supplied rate table (spec §9 design notes) — it does not invoice or
/// settle accounts.
#[derive(Debug, Default)]
pub struct BillingLedger {
    events: VecDeque<BillingEvent>,
}

impl BillingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        rates: &BillingRates,
        tenant_id: TenantId,
        requests: i64,
        tokens: i64,
        compute_units: i64,
        model_id: Option<ModelId>,
        at: DateTime<Utc>,
        retention_ms: u64,
    ) {
        let cost = cost_of(rates, requests, tokens, compute_units);
        self.events.push_back(BillingEvent { tenant_id, at, requests, tokens, compute_units, model_id, cost });
        self.prune(at, retention_ms);
    }

    fn prune(&mut self, now: DateTime<Utc>, retention_ms: u64) {
        let cutoff = now - chrono::Duration::milliseconds(retention_ms as i64);
        while let Some(front) = self.events.front() {
            if front.at < cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    /// Drains and returns every buffered event, the way a consumer would
    /// periodically flush events out to an external billing system.
    pub fn drain(&mut self) -> Vec<BillingEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_follows_the_linear_rate_formula() {
        let rates = BillingRates { per_request: 0.01, per_token: 0.001, per_compute_unit: 0.1 };
        assert!((cost_of(&rates, 2, 100, 1) - (0.02 + 0.1 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn drain_empties_the_ledger() {
        let mut ledger = BillingLedger::new();
        let rates = BillingRates::default();
        ledger.record(&rates, TenantId::new("t1"), 1, 10, 0, None, Utc::now(), 86_400_000);
        assert_eq!(ledger.len(), 1);
        let drained = ledger.drain();
        assert_eq!(drained.len(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn events_older_than_retention_are_pruned() {
        let mut ledger = BillingLedger::new();
        let rates = BillingRates::default();
        let t0 = Utc::now();
        ledger.record(&rates, TenantId::new("t1"), 1, 1, 0, None, t0 - chrono::Duration::milliseconds(200), 100);
        ledger.record(&rates, TenantId::new("t1"), 1, 1, 0, None, t0, 100);
        assert_eq!(ledger.len(), 1);
    }
}
