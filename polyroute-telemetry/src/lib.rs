//! Structured-logging initialization (spec §1 ambient stack).
//!
//! This is a deliberately scaled-down cousin of a full agent-observability
//! stack: one `fmt` + `EnvFilter` layer, no OTLP exporter and no external
//! trace-sink integration — those are out of scope (spec §1 Non-goals name
//! metrics/tracing backends as external concerns), but a router still needs
//! somewhere for its `tracing::info!`/`warn!` call sites to go.

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub default_level: String,
    pub log_directives: Vec<String>,
    pub with_thread_ids: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "polyroute".to_string(),
            default_level: "info".to_string(),
            log_directives: Vec::new(),
            with_thread_ids: true,
        }
    }
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into(), ..Default::default() }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn with_log_directive(mut self, directive: impl Into<String>) -> Self {
        self.log_directives.push(directive.into());
        self
    }

    /// Reads `SERVICE_NAME` and `LOG_LEVEL`, falling back to documented
    /// defaults when unset.
    pub fn from_env() -> Self {
        let service_name = std::env::var("SERVICE_NAME").unwrap_or_else(|_| "polyroute".to_string());
        let default_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        Self { service_name, default_level, log_directives: Vec::new(), with_thread_ids: true }
    }
}

/// Installs a global `tracing` subscriber exactly once per process. Safe to
/// call repeatedly — only the first call takes effect.
pub fn init_tracing(config: TelemetryConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.default_level.clone()));
        for directive in &config.log_directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(config.with_thread_ids)
            .with_line_number(true);

        tracing_subscriber::registry().with(filter).with(fmt_layer).init();

        tracing::info!(service.name = %config.service_name, "telemetry initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_info_level() {
        let cfg = TelemetryConfig::default();
        assert_eq!(cfg.default_level, "info");
    }

    #[test]
    fn builder_methods_compose() {
        let cfg = TelemetryConfig::new("svc").with_log_level("debug").with_log_directive("polyroute_router=trace");
        assert_eq!(cfg.service_name, "svc");
        assert_eq!(cfg.default_level, "debug");
        assert_eq!(cfg.log_directives, vec!["polyroute_router=trace".to_string()]);
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing(TelemetryConfig::default());
        init_tracing(TelemetryConfig::default());
    }
}
