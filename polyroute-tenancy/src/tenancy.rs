use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use polyroute_core::{Error, ModelId, QuotaKind, Result, TenancyConfig, TenantId};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::billing::{BillingEvent, BillingLedger};
use crate::quota_check::check_quotas;
use crate::tenant::Tenant;
use crate::usage::UsageCounter;

struct TenantEntry {
    tenant: Tenant,
    usage: UsageCounter,
}

/// The multi-tenancy subsystem: tenant records, isolation checks, quota
/// accounting, and billing-event emission (spec §4.7), kept as in-memory
/// state behind a single lock per map the way the teacher's session
/// service holds its maps.
pub struct Tenancy {
    config: TenancyConfig,
    tenants: Arc<RwLock<HashMap<TenantId, TenantEntry>>>,
    shared_pool: Arc<RwLock<HashSet<ModelId>>>,
    billing: Arc<RwLock<BillingLedger>>,
}

impl Tenancy {
    pub fn new(config: TenancyConfig) -> Self {
        Self {
            config,
            tenants: Arc::new(RwLock::new(HashMap::new())),
            shared_pool: Arc::new(RwLock::new(HashSet::new())),
            billing: Arc::new(RwLock::new(BillingLedger::new())),
        }
    }

    pub async fn create_tenant(&self, tenant: Tenant) -> Result<()> {
        let mut tenants = self.tenants.write().await;
        if tenants.contains_key(&tenant.id) {
            return Err(Error::Validation { reason: format!("tenant `{}` already exists", tenant.id) });
        }
        info!(tenant_id = %tenant.id, "tenant-created");
        tenants.insert(tenant.id.clone(), TenantEntry { tenant, usage: UsageCounter::new() });
        Ok(())
    }

    pub async fn update_tenant(
        &self,
        id: &TenantId,
        mutate: impl FnOnce(&mut Tenant) + Send,
    ) -> Result<()> {
        let mut tenants = self.tenants.write().await;
        let entry = tenants
            .get_mut(id)
            .ok_or_else(|| Error::NotFound { what: format!("tenant `{id}`") })?;
        mutate(&mut entry.tenant);
        Ok(())
    }

    pub async fn delete_tenant(&self, id: &TenantId) -> Result<()> {
        let mut tenants = self.tenants.write().await;
        tenants.remove(id).ok_or_else(|| Error::NotFound { what: format!("tenant `{id}`") })?;
        info!(tenant_id = %id, "tenant-deleted");
        Ok(())
    }

    pub async fn get_tenant(&self, id: &TenantId) -> Result<Tenant> {
        let tenants = self.tenants.read().await;
        tenants
            .get(id)
            .map(|e| e.tenant.clone())
            .ok_or_else(|| Error::NotFound { what: format!("tenant `{id}`") })
    }

    pub async fn add_to_shared_pool(&self, model_id: ModelId) {
        self.shared_pool.write().await.insert(model_id);
    }

    /// `checkModelAccess` (spec §3/§4.7).
    pub async fn check_model_access(&self, tenant_id: &TenantId, model_id: &ModelId) -> Result<()> {
        let tenants = self.tenants.read().await;
        let entry = tenants
            .get(tenant_id)
            .ok_or_else(|| Error::NotFound { what: format!("tenant `{tenant_id}`") })?;
        let pool = self.shared_pool.read().await;
        if entry.tenant.can_access_model(model_id, &pool) {
            Ok(())
        } else {
            Err(Error::AccessDenied {
                tenant_id: tenant_id.to_string(),
                model_id: model_id.to_string(),
            })
        }
    }

    /// `assignModelToTenant` (spec §4.7): enforces the tenant's `ModelCount`
    /// quota, if configured, before the assignment takes effect.
    pub async fn assign_model_to_tenant(&self, tenant_id: &TenantId, model_id: ModelId) -> Result<()> {
        let mut tenants = self.tenants.write().await;
        let entry = tenants
            .get_mut(tenant_id)
            .ok_or_else(|| Error::NotFound { what: format!("tenant `{tenant_id}`") })?;

        if entry.tenant.assigned_models.contains(&model_id) {
            return Ok(());
        }

        let mut deltas = HashMap::new();
        deltas.insert(QuotaKind::ModelCount, entry.tenant.assigned_models.len() as i64 + 1);
        check_quotas(&entry.tenant, &entry.usage, &deltas, Utc::now())?;

        entry.tenant.assigned_models.insert(model_id);
        entry.usage.set_gauge(QuotaKind::ModelCount, entry.tenant.assigned_models.len() as i64);
        Ok(())
    }

    /// `checkQuota` (spec §4.7): evaluates every kind present in `deltas`
    /// that the tenant has a configured limit for.
    pub async fn check_quota(&self, tenant_id: &TenantId, deltas: &HashMap<QuotaKind, i64>) -> Result<()> {
        let tenants = self.tenants.read().await;
        let entry = tenants
            .get(tenant_id)
            .ok_or_else(|| Error::NotFound { what: format!("tenant `{tenant_id}`") })?;
        check_quotas(&entry.tenant, &entry.usage, deltas, Utc::now())
    }

    /// `recordUsage` (spec §4.7): appends request/token history, updates the
    /// `ComputeUnits` gauge, prunes entries older than the retention window,
    /// and — if billing is enabled — appends a billing event.
    pub async fn record_usage(
        &self,
        tenant_id: &TenantId,
        requests: i64,
        tokens: i64,
        compute_units: i64,
        model_id: Option<ModelId>,
    ) -> Result<()> {
        let now = Utc::now();
        let retention_secs = self.config.usage_history_retention_ms / 1000;
        {
            let mut tenants = self.tenants.write().await;
            let entry = tenants
                .get_mut(tenant_id)
                .ok_or_else(|| Error::NotFound { what: format!("tenant `{tenant_id}`") })?;
            entry.usage.record(QuotaKind::RequestsPerMinute, requests, now, retention_secs);
            entry.usage.record(QuotaKind::TokensPerMinute, tokens, now, retention_secs);
            entry.usage.adjust_gauge(QuotaKind::ComputeUnits, compute_units);
        }

        if self.config.enable_billing {
            let mut ledger = self.billing.write().await;
            ledger.record(
                &self.config.billing_rates,
                tenant_id.clone(),
                requests,
                tokens,
                compute_units,
                model_id,
                now,
                self.config.billing_retention_ms,
            );
        }
        Ok(())
    }

    pub async fn begin_concurrent_request(&self, tenant_id: &TenantId) -> Result<()> {
        let mut tenants = self.tenants.write().await;
        let entry = tenants
            .get_mut(tenant_id)
            .ok_or_else(|| Error::NotFound { what: format!("tenant `{tenant_id}`") })?;
        let mut deltas = HashMap::new();
        deltas.insert(QuotaKind::ConcurrentRequests, entry.usage.gauge(QuotaKind::ConcurrentRequests) + 1);
        check_quotas(&entry.tenant, &entry.usage, &deltas, Utc::now())?;
        entry.usage.adjust_gauge(QuotaKind::ConcurrentRequests, 1);
        Ok(())
    }

    /// Always safe to call, including on error paths: `ConcurrentRequests`
    /// must be decremented on every terminal path of a request, not only
    /// the success path, or the gauge leaks upward until every tenant looks
    /// permanently saturated.
    pub async fn end_concurrent_request(&self, tenant_id: &TenantId) {
        let mut tenants = self.tenants.write().await;
        if let Some(entry) = tenants.get_mut(tenant_id) {
            entry.usage.adjust_gauge(QuotaKind::ConcurrentRequests, -1);
        } else {
            warn!(tenant_id = %tenant_id, "end_concurrent_request on unknown tenant");
        }
    }

    pub async fn drain_billing_events(&self) -> Vec<BillingEvent> {
        self.billing.write().await.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::IsolationMode;

    fn tenant(id: &str) -> Tenant {
        Tenant::new(TenantId::new(id), "Acme", IsolationMode::Shared)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let svc = Tenancy::new(TenancyConfig::default());
        svc.create_tenant(tenant("t1")).await.unwrap();
        let fetched = svc.get_tenant(&TenantId::new("t1")).await.unwrap();
        assert_eq!(fetched.name, "Acme");
    }

    #[tokio::test]
    async fn duplicate_creation_is_rejected() {
        let svc = Tenancy::new(TenancyConfig::default());
        svc.create_tenant(tenant("t1")).await.unwrap();
        let err = svc.create_tenant(tenant("t1")).await.unwrap_err();
        assert_eq!(err.kind(), "Validation");
    }

    #[tokio::test]
    async fn assign_model_to_tenant_enforces_model_count_quota() {
        let svc = Tenancy::new(TenancyConfig::default());
        let mut t = tenant("t1");
        t.quotas.insert(QuotaKind::ModelCount, 1);
        svc.create_tenant(t).await.unwrap();

        svc.assign_model_to_tenant(&TenantId::new("t1"), ModelId::new("m1")).await.unwrap();
        let err = svc
            .assign_model_to_tenant(&TenantId::new("t1"), ModelId::new("m2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "QuotaExceeded");
    }

    #[tokio::test]
    async fn concurrent_request_gauge_is_decremented_on_end() {
        let svc = Tenancy::new(TenancyConfig::default());
        let mut t = tenant("t1");
        t.quotas.insert(QuotaKind::ConcurrentRequests, 1);
        svc.create_tenant(t).await.unwrap();
        let id = TenantId::new("t1");

        svc.begin_concurrent_request(&id).await.unwrap();
        assert!(svc.begin_concurrent_request(&id).await.is_err());
        svc.end_concurrent_request(&id).await;
        svc.begin_concurrent_request(&id).await.unwrap();
    }

    #[tokio::test]
    async fn record_usage_emits_a_billing_event_when_enabled() {
        let svc = Tenancy::new(TenancyConfig::default());
        svc.create_tenant(tenant("t1")).await.unwrap();
        svc.record_usage(&TenantId::new("t1"), 1, 100, 0, None).await.unwrap();
        let events = svc.drain_billing_events().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].cost > 0.0);
    }

    #[tokio::test]
    async fn model_access_respects_isolation_mode() {
        let svc = Tenancy::new(TenancyConfig::default());
        let mut t = tenant("t1");
        t.isolation_mode = IsolationMode::Strict;
        svc.create_tenant(t).await.unwrap();
        svc.add_to_shared_pool(ModelId::new("shared")).await;

        let id = TenantId::new("t1");
        assert!(svc.check_model_access(&id, &ModelId::new("shared")).await.is_err());
        svc.assign_model_to_tenant(&id, ModelId::new("private")).await.unwrap();
        assert!(svc.check_model_access(&id, &ModelId::new("private")).await.is_ok());
    }
}
