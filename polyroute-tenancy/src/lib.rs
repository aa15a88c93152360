//! Tenant records, isolation-mode access checks, sliding-window quota
//! accounting, and billing-event emission (spec §3, §4.7).

mod billing;
mod quota_check;
mod tenancy;
mod tenant;
mod usage;

pub use billing::{BillingEvent, BillingLedger};
pub use quota_check::check_quotas;
pub use tenancy::Tenancy;
pub use tenant::{IsolationMode, Tenant, TenantStatus};
pub use usage::UsageCounter;
