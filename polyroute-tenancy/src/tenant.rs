use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use polyroute_core::{ModelId, QuotaKind, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How strictly a tenant is confined to its explicitly assigned models
/// (spec §3 Tenant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsolationMode {
    /// Only models explicitly assigned to the tenant are accessible.
    Strict,
    /// Any model in the shared pool is accessible, assignment is advisory.
    Shared,
    /// The union of the shared pool and the tenant's own assignments.
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub isolation_mode: IsolationMode,
    pub quotas: HashMap<QuotaKind, i64>,
    pub assigned_models: HashSet<ModelId>,
    pub metadata: HashMap<String, Value>,
    pub status: TenantStatus,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(id: TenantId, name: impl Into<String>, isolation_mode: IsolationMode) -> Self {
        Self {
            id,
            name: name.into(),
            isolation_mode,
            quotas: HashMap::new(),
            assigned_models: HashSet::new(),
            metadata: HashMap::new(),
            status: TenantStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// `checkModelAccess` (spec §3): whether this tenant may use `model_id`
    /// given its isolation mode. `shared_pool` holds the ids considered
    /// generally available outside of any explicit per-tenant assignment.
    pub fn can_access_model(&self, model_id: &ModelId, shared_pool: &HashSet<ModelId>) -> bool {
        match self.isolation_mode {
            IsolationMode::Strict => self.assigned_models.contains(model_id),
            IsolationMode::Shared => shared_pool.contains(model_id),
            IsolationMode::Hybrid => {
                shared_pool.contains(model_id) || self.assigned_models.contains(model_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(mode: IsolationMode) -> Tenant {
        Tenant::new(TenantId::new("t1"), "Acme", mode)
    }

    #[test]
    fn strict_mode_requires_explicit_assignment() {
        let mut t = tenant(IsolationMode::Strict);
        let pool: HashSet<ModelId> = HashSet::from([ModelId::new("shared-a")]);
        let m = ModelId::new("m1");
        assert!(!t.can_access_model(&m, &pool));
        t.assigned_models.insert(m.clone());
        assert!(t.can_access_model(&m, &pool));
        assert!(!t.can_access_model(&ModelId::new("shared-a"), &pool));
    }

    #[test]
    fn shared_mode_ignores_assignment() {
        let t = tenant(IsolationMode::Shared);
        let pool: HashSet<ModelId> = HashSet::from([ModelId::new("shared-a")]);
        assert!(t.can_access_model(&ModelId::new("shared-a"), &pool));
        assert!(!t.can_access_model(&ModelId::new("other"), &pool));
    }

    #[test]
    fn hybrid_mode_is_the_union() {
        let mut t = tenant(IsolationMode::Hybrid);
        t.assigned_models.insert(ModelId::new("private-a"));
        let pool: HashSet<ModelId> = HashSet::from([ModelId::new("shared-a")]);
        assert!(t.can_access_model(&ModelId::new("shared-a"), &pool));
        assert!(t.can_access_model(&ModelId::new("private-a"), &pool));
        assert!(!t.can_access_model(&ModelId::new("neither"), &pool));
    }
}
