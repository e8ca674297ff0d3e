//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, concurrency).
    pub listener: ListenerConfig,

    /// Prefix-to-backend route definitions.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Header handling on forwarded requests.
    pub proxy: ForwardingConfig,

    /// Static page contents for `/` and `/error`.
    pub pages: PagesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests handled concurrently (backpressure).
    pub max_in_flight: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_in_flight: 10_000,
        }
    }
}

/// A single prefix route.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics. Derived from the prefix when empty.
    #[serde(default)]
    pub name: Option<String>,

    /// Segment-aligned path prefix, e.g. `/user`.
    pub prefix: String,

    /// Base URL of the backend service, e.g. `http://localhost:8081`.
    pub backend_url: String,

    /// Remove the prefix before forwarding.
    #[serde(default = "default_strip_prefix")]
    pub strip_prefix: bool,

    /// Request headers never forwarded to this backend.
    #[serde(default)]
    pub sensitive_headers: Vec<String>,
}

impl RouteConfig {
    /// Shorthand for a stripping route with no sensitive headers.
    pub fn new(prefix: impl Into<String>, backend_url: impl Into<String>) -> Self {
        Self {
            name: None,
            prefix: prefix.into(),
            backend_url: backend_url.into(),
            strip_prefix: true,
            sensitive_headers: Vec::new(),
        }
    }
}

fn default_strip_prefix() -> bool {
    true
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Backend call timeout (send + full response body) in milliseconds.
    pub upstream_ms: u64,

    /// Whole inbound request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_ms: 30_000,
            request_secs: 60,
        }
    }
}

/// Request and response size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound request body in bytes.
    pub max_body_bytes: usize,

    /// Maximum backend response body in bytes.
    pub max_response_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            max_response_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Forwarding header behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Add X-Forwarded-{Host,Proto,Prefix,For} to forwarded requests.
    pub add_forwarded_headers: bool,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            add_forwarded_headers: true,
        }
    }
}

/// Bodies for the two non-routed pages.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PagesConfig {
    pub index: String,
    pub error: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            index: "index".to_string(),
            error: "error".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// Admin API bind address. Keep it on loopback.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:9081".to_string(),
        }
    }
}
