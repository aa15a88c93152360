use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use polyroute_core::QuotaKind;

/// A single timestamped contribution to a sliding-window quota's history.
#[derive(Debug, Clone)]
struct UsageEvent {
    at: DateTime<Utc>,
    amount: i64,
}

/// The dimension a sliding-window `QuotaKind` draws its history from. Request
/// and token counters share one history stream each across their
/// minute/hour/day variants; only the window length differs.
fn history_dimension(kind: QuotaKind) -> Option<Dimension> {
    match kind {
        QuotaKind::RequestsPerMinute | QuotaKind::RequestsPerHour | QuotaKind::RequestsPerDay => {
            Some(Dimension::Requests)
        }
        QuotaKind::TokensPerMinute | QuotaKind::TokensPerHour | QuotaKind::TokensPerDay => {
            Some(Dimension::Tokens)
        }
        QuotaKind::ConcurrentRequests
        | QuotaKind::ModelCount
        | QuotaKind::StorageGb
        | QuotaKind::ComputeUnits => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Requests,
    Tokens,
}

/// Per-tenant usage accounting: sliding-window history for rate quotas and
/// plain gauges for point-in-time quotas (spec §3 Usage Counter, §4.7
/// `checkQuota`/`recordUsage`).
#[derive(Debug, Clone, Default)]
pub struct UsageCounter {
    request_history: VecDeque<UsageEvent>,
    token_history: VecDeque<UsageEvent>,
    gauges: HashMap<QuotaKind, i64>,
}

impl UsageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn history_mut(&mut self, dim: Dimension) -> &mut VecDeque<UsageEvent> {
        match dim {
            Dimension::Requests => &mut self.request_history,
            Dimension::Tokens => &mut self.token_history,
        }
    }

    fn history(&self, dim: Dimension) -> &VecDeque<UsageEvent> {
        match dim {
            Dimension::Requests => &self.request_history,
            Dimension::Tokens => &self.token_history,
        }
    }

    /// Sum of history entries within the last `window_secs`, as of `now`.
    fn windowed_sum(&self, dim: Dimension, window_secs: u64, now: DateTime<Utc>) -> i64 {
        let cutoff = now - chrono::Duration::seconds(window_secs as i64);
        self.history(dim).iter().filter(|e| e.at >= cutoff).map(|e| e.amount).sum()
    }

    /// The value `checkQuota` would compare against a tenant's configured
    /// limit for `kind`, as of `now`, accounting for a prospective `delta`
    /// not yet recorded.
    pub fn projected_usage(&self, kind: QuotaKind, delta: i64, now: DateTime<Utc>) -> i64 {
        match history_dimension(kind) {
            Some(dim) => self.windowed_sum(dim, kind.window_secs(), now) + delta,
            None => self.gauges.get(&kind).copied().unwrap_or(0) + delta,
        }
    }

    pub fn gauge(&self, kind: QuotaKind) -> i64 {
        self.gauges.get(&kind).copied().unwrap_or(0)
    }

    pub fn set_gauge(&mut self, kind: QuotaKind, value: i64) {
        self.gauges.insert(kind, value);
    }

    pub fn adjust_gauge(&mut self, kind: QuotaKind, delta: i64) {
        let entry = self.gauges.entry(kind).or_insert(0);
        *entry = (*entry + delta).max(0);
    }

    /// Appends a request/token contribution to the appropriate history
    /// stream, then prunes entries older than `retention_secs`.
    pub fn record(&mut self, dim_kind: QuotaKind, amount: i64, now: DateTime<Utc>, retention_secs: u64) {
        if let Some(dim) = history_dimension(dim_kind) {
            self.history_mut(dim).push_back(UsageEvent { at: now, amount });
            self.prune(dim, now, retention_secs);
        }
    }

    fn prune(&mut self, dim: Dimension, now: DateTime<Utc>, retention_secs: u64) {
        let cutoff = now - chrono::Duration::seconds(retention_secs as i64);
        let history = self.history_mut(dim);
        while let Some(front) = history.front() {
            if front.at < cutoff {
                history.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn requests_in_history(&self) -> usize {
        self.request_history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_window_sum_excludes_events_outside_the_window() {
        let mut c = UsageCounter::new();
        let t0 = Utc::now();
        c.record(QuotaKind::RequestsPerMinute, 1, t0 - chrono::Duration::seconds(120), 86_400);
        c.record(QuotaKind::RequestsPerMinute, 1, t0 - chrono::Duration::seconds(10), 86_400);
        let used = c.projected_usage(QuotaKind::RequestsPerMinute, 0, t0);
        assert_eq!(used, 1);
    }

    #[test]
    fn gauge_quotas_read_directly() {
        let mut c = UsageCounter::new();
        c.set_gauge(QuotaKind::ConcurrentRequests, 2);
        assert_eq!(c.projected_usage(QuotaKind::ConcurrentRequests, 1, Utc::now()), 3);
    }

    #[test]
    fn old_history_is_pruned_on_record() {
        let mut c = UsageCounter::new();
        let t0 = Utc::now();
        c.record(QuotaKind::RequestsPerDay, 5, t0 - chrono::Duration::seconds(90_000), 86_400);
        c.record(QuotaKind::RequestsPerDay, 1, t0, 86_400);
        assert_eq!(c.requests_in_history(), 1);
    }

    #[test]
    fn adjust_gauge_never_goes_negative() {
        let mut c = UsageCounter::new();
        c.adjust_gauge(QuotaKind::ConcurrentRequests, -1);
        assert_eq!(c.gauge(QuotaKind::ConcurrentRequests), 0);
    }
}
