//! Compiled route table.
//!
//! # Responsibilities
//! - Compile `RouteConfig` entries into matchers and parsed backend URLs
//! - Look up the most specific route for a path
//! - Compute the forwarded path for a match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Routes sorted by descending prefix length, so the first hit is the
//!   longest match
//! - Reload builds a new table; nothing is mutated in place

use axum::http::HeaderName;
use url::Url;

use crate::config::{RouteConfig, ValidationError};
use crate::routing::matcher::PathPrefixMatcher;

/// A single compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    /// Route identifier for logging/metrics.
    pub name: String,
    pub matcher: PathPrefixMatcher,
    /// Backend base URL.
    pub backend: Url,
    pub strip_prefix: bool,
    /// Lowercased request headers never forwarded.
    pub sensitive_headers: Vec<HeaderName>,
}

impl Route {
    /// Compile a route from configuration.
    pub fn from_config(config: &RouteConfig) -> Result<Self, ValidationError> {
        let backend = Url::parse(&config.backend_url).map_err(|e| ValidationError::BackendUrl {
            prefix: config.prefix.clone(),
            url: config.backend_url.clone(),
            reason: e.to_string(),
        })?;

        let sensitive_headers = config
            .sensitive_headers
            .iter()
            .map(|name| {
                HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes())
                    .map_err(|_| ValidationError::HeaderName(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name = config.name.clone().unwrap_or_else(|| default_name(&config.prefix));

        Ok(Self {
            name,
            matcher: PathPrefixMatcher::new(config.prefix.clone()),
            backend,
            strip_prefix: config.strip_prefix,
            sensitive_headers,
        })
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }
}

fn default_name(prefix: &str) -> String {
    match prefix.trim_start_matches('/') {
        "" => "root".to_string(),
        rest => rest.to_string(),
    }
}

/// The result of a successful lookup.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    /// Path to request on the backend, relative to its base URL.
    pub forwarded_path: &'a str,
}

/// Ordered, immutable set of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build a table from configuration. Most specific prefixes come first.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, ValidationError> {
        let mut routes = configs
            .iter()
            .map(Route::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        routes.sort_by(|a, b| b.matcher.specificity().cmp(&a.matcher.specificity()));
        Ok(Self { routes })
    }

    /// Find the longest matching prefix for `path`.
    pub fn find<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a>> {
        self.routes.iter().find_map(|route| {
            let rest = route.matcher.remainder(path)?;
            let forwarded_path = match (route.strip_prefix, rest) {
                (false, _) => path,
                (true, "") => "/",
                (true, rest) => rest,
            };
            Some(RouteMatch {
                route,
                forwarded_path,
            })
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
