//! Configuration from environment variables.
//!
//! # Environment Variables
//!
//! - `COMPOSE_MAX_CALL_DEPTH`: nesting limit of calls into the proxy (default: 1024)
//! - `COMPOSE_MAX_SELECTORS`: registry capacity (default: 65536)
//! - `COMPOSE_ENFORCE_OWNER`: owner gate on the batch-cut entrypoint (default: true)
//! - `COMPOSE_REQUEST_TIMEOUT_MS`: service request timeout (default: 5000)
//! - `COMPOSE_ENABLE_TRACING`: per-request debug logging in the service (default: false)
//! - `COMPOSE_LOG_LEVEL` or `RUST_LOG`: log level (default: info)
//! - `COMPOSE_JSON_LOGS`: JSON formatted logs (default: false)
//! - `COMPOSE_SERVICE_NAME`: service name in logs (default: compose-diamond)
//!
//! Missing or unparsable values fall back to the defaults.

use crate::domain::entities::DiamondConfig;
use crate::domain::invariants::limits;
use std::env;

/// Default service name.
pub const DEFAULT_SERVICE_NAME: &str = "compose-diamond";

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn flag_or(value: Option<String>, default: bool) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "true" || v == "1" => true,
        Some(v) if v == "false" || v == "0" => false,
        _ => default,
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

// =============================================================================
// DIAMOND
// =============================================================================

impl DiamondConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(var)
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            max_call_depth: parse_or(lookup("COMPOSE_MAX_CALL_DEPTH"), limits::MAX_CALL_DEPTH),
            max_selectors: parse_or(lookup("COMPOSE_MAX_SELECTORS"), limits::MAX_SELECTORS),
            enforce_owner: flag_or(lookup("COMPOSE_ENFORCE_OWNER"), true),
        }
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// Diamond service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Proxy configuration.
    pub diamond: DiamondConfig,
    /// Time allowed to acquire the proxy, in milliseconds.
    pub request_timeout_ms: u64,
    /// Enable detailed per-request logging.
    pub enable_tracing: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            diamond: DiamondConfig::default(),
            request_timeout_ms: limits::REQUEST_TIMEOUT_MS,
            enable_tracing: false,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            diamond: DiamondConfig::from_lookup(&lookup),
            request_timeout_ms: parse_or(
                lookup("COMPOSE_REQUEST_TIMEOUT_MS"),
                limits::REQUEST_TIMEOUT_MS,
            ),
            enable_tracing: flag_or(lookup("COMPOSE_ENABLE_TRACING"), false),
        }
    }
}

// =============================================================================
// TELEMETRY
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for logs
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_name: lookup("COMPOSE_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            log_level: lookup("COMPOSE_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),
            json_logs: flag_or(lookup("COMPOSE_JSON_LOGS"), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.diamond.max_call_depth, 1024);
        assert_eq!(config.diamond.max_selectors, 65_536);
        assert!(config.diamond.enforce_owner);
        assert_eq!(config.request_timeout_ms, 5_000);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("COMPOSE_MAX_CALL_DEPTH", "8"),
            ("COMPOSE_MAX_SELECTORS", "100"),
            ("COMPOSE_ENFORCE_OWNER", "false"),
            ("COMPOSE_REQUEST_TIMEOUT_MS", "250"),
        ]));
        assert_eq!(config.diamond.max_call_depth, 8);
        assert_eq!(config.diamond.max_selectors, 100);
        assert!(!config.diamond.enforce_owner);
        assert_eq!(config.request_timeout_ms, 250);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = DiamondConfig::from_lookup(lookup(&[
            ("COMPOSE_MAX_CALL_DEPTH", "deep"),
            ("COMPOSE_ENFORCE_OWNER", "maybe"),
        ]));
        assert_eq!(config, DiamondConfig::default());
    }

    #[test]
    fn test_telemetry_log_level_precedence() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("RUST_LOG", "warn"),
            ("COMPOSE_LOG_LEVEL", "debug"),
        ]));
        assert_eq!(config.log_level, "debug");

        let config = TelemetryConfig::from_lookup(lookup(&[("RUST_LOG", "warn")]));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
        assert!(!config.json_logs);
    }
}
