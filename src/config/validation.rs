//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route prefixes and backend URLs are usable
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route prefix {0:?} must start with '/'")]
    PrefixNotAbsolute(String),

    #[error("route prefix {0:?} must not end with '/'")]
    PrefixTrailingSlash(String),

    #[error("route prefix {0:?} must not contain '?', '#' or empty segments")]
    PrefixInvalid(String),

    #[error("route prefix {0:?} is configured more than once")]
    DuplicatePrefix(String),

    #[error("backend url {url:?} for prefix {prefix:?}: {reason}")]
    BackendUrl {
        prefix: String,
        url: String,
        reason: String,
    },

    #[error("sensitive header {0:?} is not a valid header name")]
    HeaderName(String),

    #[error("{field} address {value:?} is not a socket address")]
    Address { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("timeouts.request_secs ({request_secs}s) must exceed timeouts.upstream_ms ({upstream_ms}ms)")]
    RequestDeadline { request_secs: u64, upstream_ms: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for route in &config.routes {
        let prefix = route.prefix.as_str();
        if !prefix.starts_with('/') {
            errors.push(ValidationError::PrefixNotAbsolute(prefix.to_string()));
        } else if prefix.len() > 1 && prefix.ends_with('/') {
            errors.push(ValidationError::PrefixTrailingSlash(prefix.to_string()));
        } else if prefix.contains(['?', '#']) || prefix.contains("//") {
            errors.push(ValidationError::PrefixInvalid(prefix.to_string()));
        }

        if !seen.insert(prefix) {
            errors.push(ValidationError::DuplicatePrefix(prefix.to_string()));
        }

        for name in &route.sensitive_headers {
            if HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes()).is_err() {
                errors.push(ValidationError::HeaderName(name.clone()));
            }
        }

        if let Err(reason) = check_backend_url(&route.backend_url) {
            errors.push(ValidationError::BackendUrl {
                prefix: prefix.to_string(),
                url: route.backend_url.clone(),
                reason,
            });
        }
    }

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.listener.max_in_flight == 0 {
        errors.push(ValidationError::Zero("listener.max_in_flight"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.upstream_ms == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    } else if config.timeouts.request_secs.saturating_mul(1000) <= config.timeouts.upstream_ms {
        errors.push(ValidationError::RequestDeadline {
            request_secs: config.timeouts.request_secs,
            upstream_ms: config.timeouts.upstream_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_backend_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn config_with(routes: Vec<RouteConfig>) -> ProxyConfig {
        ProxyConfig {
            routes,
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn accepts_reference_routes() {
        let config = config_with(vec![
            RouteConfig::new("/user", "http://localhost:8081"),
            RouteConfig::new("/admin", "http://localhost:8082"),
            RouteConfig::new("/mod", "http://localhost:8083"),
        ]);
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn accepts_root_catch_all() {
        let config = config_with(vec![RouteConfig::new("/", "http://localhost:8081")]);
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let config = config_with(vec![
            RouteConfig::new("user", "http://localhost:8081"),
            RouteConfig::new("/admin/", "http://localhost:8082"),
            RouteConfig::new("/mod", "https://localhost:8083"),
            RouteConfig::new("/mod", "not a url"),
        ]);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.contains(&ValidationError::PrefixNotAbsolute("user".into())));
        assert!(errors.contains(&ValidationError::PrefixTrailingSlash("/admin/".into())));
        assert!(errors.contains(&ValidationError::DuplicatePrefix("/mod".into())));
    }

    #[test]
    fn rejects_bad_listener_and_zero_timeouts() {
        let mut config = config_with(Vec::new());
        config.listener.bind_address = "localhost".into();
        config.timeouts.upstream_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::Address {
                    field: "listener.bind_address",
                    value: "localhost".into(),
                },
                ValidationError::Zero("timeouts.upstream_ms"),
            ]
        );
    }

    #[test]
    fn request_deadline_must_outlast_upstream_deadline() {
        let mut config = config_with(Vec::new());
        config.timeouts.request_secs = 1;
        config.timeouts.upstream_ms = 5_000;

        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RequestDeadline {
                request_secs: 1,
                upstream_ms: 5_000,
            }])
        );

        config.timeouts.upstream_ms = 999;
        assert_eq!(validate_config(&config), Ok(()));
    }
}
