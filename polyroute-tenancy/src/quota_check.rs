use std::collections::HashMap;

use chrono::{DateTime, Utc};
use polyroute_core::{Error, QuotaKind, Result};

use crate::tenant::Tenant;
use crate::usage::UsageCounter;

/// `checkQuota` (spec §4.7): for every quota kind present in `deltas` that
/// the tenant has configured a limit for, evaluates the kind's projected
/// usage against that limit. Evaluation order follows `QuotaKind::ORDER` so
/// the first breach reported is deterministic across runs.
pub fn check_quotas(
    tenant: &Tenant,
    usage: &UsageCounter,
    deltas: &HashMap<QuotaKind, i64>,
    now: DateTime<Utc>,
) -> Result<()> {
    for kind in QuotaKind::ORDER {
        let Some(&delta) = deltas.get(&kind) else { continue };
        let Some(&limit) = tenant.quotas.get(&kind) else { continue };
        let projected = usage.projected_usage(kind, delta, now);
        if projected > limit {
            return Err(Error::QuotaExceeded { kind, used: projected, limit });
        }
    }
    Ok(())
}
