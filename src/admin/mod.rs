//! Read-only admin API.
//!
//! Served on its own listener (`admin.bind_address`) so it never collides
//! with proxied paths.
//!
//! - `GET /status`: version, health and route count
//! - `GET /routes`: the active route table in match order

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::{get_routes, get_status};
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/routes", get(get_routes))
        .with_state(state)
}
