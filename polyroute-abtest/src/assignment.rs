use chrono::{DateTime, Utc};
use polyroute_core::{ExperimentId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A deterministic `(experiment-id, user-id) -> variant` mapping (spec §3
/// Assignment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub experiment_id: ExperimentId,
    pub user_id: UserId,
    pub variant: String,
    pub assigned_at: DateTime<Utc>,
}

/// One `trackEvent` contribution appended to a variant's event buffer
/// (spec §4.8 `trackEvent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub user_id: UserId,
    pub event_name: String,
    pub data: Value,
    pub at: DateTime<Utc>,
}
