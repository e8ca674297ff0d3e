//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Captured request (method, path, query, headers, body)
//!     → table.rs (longest segment-aligned prefix lookup)
//!     → matcher.rs (evaluate prefix, compute remainder)
//!     → router.rs (rewrite URI, filter headers, forward, relay)
//!     → ProxyResponse or ProxyError
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Parse backend URLs, compile matchers
//!     → Sort by prefix length
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled up front, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Longest prefix wins

pub mod matcher;
pub mod router;
pub mod table;

pub use matcher::PathPrefixMatcher;
pub use router::Router;
pub use table::{Route, RouteMatch, RouteTable};
