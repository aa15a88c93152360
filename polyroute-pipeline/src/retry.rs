use std::future::Future;
use std::time::{Duration, Instant};

use polyroute_core::{Error, Result};
use rand::Rng;
use tracing::warn;

/// An attempt is assumed to need at least this long; no further retry is
/// started once less than this remains in the request's deadline budget
/// (spec §5: "Retries ... must respect the overall request deadline; no
/// retry may start if remaining budget < expected minimum latency").
const MIN_EXPECTED_LATENCY_MS: u64 = 200;

/// Exponential backoff with ±10% jitter, capped at `max_delay_ms` (spec
/// §4.6 step 4): `delay = min(base_delay_ms * 2^attempt, max_delay_ms)`.
fn backoff_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> Duration {
    let raw_ms = base_delay_ms.saturating_mul(1u64 << attempt.min(20));
    let capped_ms = raw_ms.min(max_delay_ms);
    let jitter_fraction = rand::thread_rng().gen_range(-0.1..=0.1);
    let jittered_ms = (capped_ms as f64 * (1.0 + jitter_fraction)).max(0.0) as u64;
    Duration::from_millis(jittered_ms)
}

/// Retries `operation` up to `retries + 1` total attempts (spec §4.6 step 4),
/// never starting a new attempt once `deadline` leaves less than
/// `MIN_EXPECTED_LATENCY_MS` remaining. Never retries `InvalidRequest` or
/// authentication failures (`Unauthorized`/`AccessDenied`), even when
/// `error.is_retryable()` would otherwise allow a retry of a different kind
/// on a later attempt.
pub async fn retry_with_backoff<T, F, Fut>(
    retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    deadline: Instant,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = retries + 1;
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_never_retried(&err) => return Err(err),
            Err(err) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(err);
                }
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.as_millis() < MIN_EXPECTED_LATENCY_MS as u128 {
                    return Err(err);
                }
                warn!(attempt, kind = err.kind(), "pipeline retrying after backoff");
                tokio::time::sleep(backoff_delay(attempt - 1, base_delay_ms, max_delay_ms)).await;
            }
        }
    }
}

fn is_never_retried(err: &Error) -> bool {
    matches!(err, Error::InvalidRequest { .. } | Error::Unauthorized | Error::AccessDenied { .. })
}
