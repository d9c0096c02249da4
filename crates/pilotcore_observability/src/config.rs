//! Configuration for observability/telemetry (§10.1).

use serde::{Deserialize, Serialize};

/// Observability configuration for the agent execution core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Service name for traces (e.g. "pilotcore-runtime").
    pub service_name: String,

    /// Service version (optional, defaults to unset).
    pub service_version: Option<String>,

    /// OTLP endpoint for trace export (e.g. "http://localhost:4317").
    pub otlp_endpoint: Option<String>,

    /// Enable console/log output in addition to OTLP export.
    pub enable_console: bool,

    /// Log level filter (e.g. "info", "debug", "trace"). Defaults to "info".
    pub log_level: Option<String>,

    /// Additional resource attributes.
    pub resource_attributes: Vec<(String, String)>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "pilotcore-runtime".to_string(),
            service_version: None,
            otlp_endpoint: None,
            enable_console: true,
            log_level: None,
            resource_attributes: Vec::new(),
        }
    }
}

impl ObservabilityConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_console(mut self, enable: bool) -> Self {
        self.enable_console = enable;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn with_resource_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_attributes.push((key.into(), value.into()));
        self
    }

    /// Reads `PILOTCORE_OTEL_SERVICE_NAME`/`PILOTCORE_OTEL_SERVICE_VERSION`/
    /// `PILOTCORE_OTEL_ENDPOINT`/`PILOTCORE_LOG_LEVEL` (falling back to `RUST_LOG`).
    pub fn from_env() -> Self {
        let service_name = std::env::var("PILOTCORE_OTEL_SERVICE_NAME")
            .unwrap_or_else(|_| "pilotcore-runtime".to_string());
        let service_version = std::env::var("PILOTCORE_OTEL_SERVICE_VERSION").ok();
        // Only enable OTLP when explicitly set; otherwise console-only (avoids connection-refused noise).
        let otlp_endpoint = std::env::var("PILOTCORE_OTEL_ENDPOINT").ok();
        let log_level = std::env::var("PILOTCORE_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok();

        Self {
            service_name,
            service_version,
            otlp_endpoint,
            enable_console: true,
            log_level,
            resource_attributes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = ObservabilityConfig::new("pilot-agent")
            .with_version("0.1.0")
            .with_otlp_endpoint("http://localhost:4317")
            .with_log_level("debug");
        assert_eq!(config.service_name, "pilot-agent");
        assert_eq!(config.service_version.as_deref(), Some("0.1.0"));
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://localhost:4317"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn default_enables_console_only() {
        let config = ObservabilityConfig::default();
        assert!(config.enable_console);
        assert!(config.otlp_endpoint.is_none());
    }
}
