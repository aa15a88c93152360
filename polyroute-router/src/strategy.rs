use serde::{Deserialize, Serialize};

/// One of the eight selection strategies a request declares (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouterStrategy {
    QualityFirst,
    CostOptimized,
    SpeedPriority,
    Balanced,
    RoundRobin,
    LeastLoaded,
    CapabilityMatch,
    Random,
}

impl Default for RouterStrategy {
    fn default() -> Self {
        RouterStrategy::Balanced
    }
}
