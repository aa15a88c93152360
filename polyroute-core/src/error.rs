//! The router's stable error taxonomy.
//!
//! Every kind here is transport-agnostic (spec §7): a kind, a short stable
//! message, and a structured field bag. Internal causes (upstream HTTP
//! errors, I/O failures) are logged via `tracing` at the call site and never
//! surfaced to the caller beyond the message on [`Error::UpstreamError`] /
//! [`Error::Internal`].

use thiserror::Error;

use crate::quota::QuotaKind;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The requirement filter yielded an empty candidate set.
    #[error("no model satisfies the request's requirements")]
    NoCandidate,

    /// No `Loader` is registered for the detected format.
    #[error("no loader registered for format `{format}`")]
    NoLoader { format: String },

    /// A `Model` operation was invoked while the model was not loaded.
    #[error("model `{model_id}` is not loaded")]
    NotLoaded { model_id: String },

    /// A deadline was exceeded.
    #[error("operation timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    Timeout { elapsed_ms: u64, budget_ms: u64 },

    /// The upstream provider signaled a rate limit.
    #[error("rate limited by upstream{}", retry_after_ms.map(|ms| format!(", retry after {ms}ms")).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    /// Malformed prompt or out-of-range options. Never retried.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// A transient upstream failure. Retried by the Pipeline.
    #[error("upstream error: {reason}")]
    UpstreamError { reason: String },

    /// A streaming integrity check failed.
    #[error("corrupted stream: {reason}")]
    CorruptedStream { reason: String },

    /// A tenant quota was breached.
    #[error("quota exceeded: {kind:?} used={used} limit={limit}")]
    QuotaExceeded { kind: QuotaKind, used: i64, limit: i64 },

    /// The tenant lacks access to the requested model under its isolation mode.
    #[error("tenant `{tenant_id}` denied access to model `{model_id}`")]
    AccessDenied { tenant_id: String, model_id: String },

    /// Missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// A registry, tenancy, or experiment entity was not found.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// A caller-supplied configuration or entity failed validation.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// Catch-all for internal invariant violations and wrapped I/O errors.
    /// The `#[source]` is logged, never serialized back to a caller.
    #[error("internal error: {reason}")]
    Internal {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Stable kind name, independent of the `Display` message — useful for
    /// metrics labels and cross-language error codes.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NoCandidate => "NoCandidate",
            Error::NoLoader { .. } => "NoLoader",
            Error::NotLoaded { .. } => "NotLoaded",
            Error::Timeout { .. } => "Timeout",
            Error::RateLimited { .. } => "RateLimited",
            Error::InvalidRequest { .. } => "InvalidRequest",
            Error::UpstreamError { .. } => "UpstreamError",
            Error::CorruptedStream { .. } => "CorruptedStream",
            Error::QuotaExceeded { .. } => "QuotaExceeded",
            Error::AccessDenied { .. } => "AccessDenied",
            Error::Unauthorized => "Unauthorized",
            Error::NotFound { .. } => "NotFound",
            Error::Validation { .. } => "Validation",
            Error::Internal { .. } => "Internal",
        }
    }

    /// Policy errors are never subject to Orchestrator fallback (spec §7).
    pub fn is_policy_error(&self) -> bool {
        matches!(self, Error::QuotaExceeded { .. } | Error::AccessDenied { .. } | Error::Unauthorized)
    }

    /// Errors the Pipeline retries locally with backoff (spec §4.6 step 4).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited { .. } | Error::UpstreamError { .. })
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Error::Internal { reason: reason.into(), source: None }
    }

    pub fn internal_with_source(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Internal { reason: reason.into(), source: Some(Box::new(source)) }
    }
}
