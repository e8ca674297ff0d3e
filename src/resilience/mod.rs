//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (enforce the upstream deadline)
//!     → On failure: surface 502/504 once, no retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Failures are reported exactly once per inbound request

pub mod timeouts;
