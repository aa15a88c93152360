use serde::{Deserialize, Serialize};

/// The closed set of quota types a tenant can be constrained by (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuotaKind {
    RequestsPerMinute,
    RequestsPerHour,
    RequestsPerDay,
    TokensPerMinute,
    TokensPerHour,
    TokensPerDay,
    ConcurrentRequests,
    ModelCount,
    StorageGb,
    ComputeUnits,
}

impl QuotaKind {
    /// The sliding-window length in seconds, or `0` for a gauge quota read
    /// directly off the current counter value (spec §4.7 `checkQuota`).
    pub fn window_secs(self) -> u64 {
        match self {
            QuotaKind::RequestsPerMinute | QuotaKind::TokensPerMinute => 60,
            QuotaKind::RequestsPerHour | QuotaKind::TokensPerHour => 3_600,
            QuotaKind::RequestsPerDay | QuotaKind::TokensPerDay => 86_400,
            QuotaKind::ConcurrentRequests
            | QuotaKind::ModelCount
            | QuotaKind::StorageGb
            | QuotaKind::ComputeUnits => 0,
        }
    }

    /// Stable enumeration order used so the first quota breach reported by
    /// `checkQuota` is deterministic (spec §4.7).
    pub const ORDER: [QuotaKind; 10] = [
        QuotaKind::RequestsPerMinute,
        QuotaKind::RequestsPerHour,
        QuotaKind::RequestsPerDay,
        QuotaKind::TokensPerMinute,
        QuotaKind::TokensPerHour,
        QuotaKind::TokensPerDay,
        QuotaKind::ConcurrentRequests,
        QuotaKind::ModelCount,
        QuotaKind::StorageGb,
        QuotaKind::ComputeUnits,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_quotas_have_zero_window() {
        assert_eq!(QuotaKind::ConcurrentRequests.window_secs(), 0);
        assert_eq!(QuotaKind::ModelCount.window_secs(), 0);
    }

    #[test]
    fn sliding_window_quotas_have_nonzero_window() {
        assert_eq!(QuotaKind::RequestsPerMinute.window_secs(), 60);
        assert_eq!(QuotaKind::TokensPerDay.window_secs(), 86_400);
    }
}
