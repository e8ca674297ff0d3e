//! Built-in pages served by the gateway itself.
//!
//! `/` and `/error` are answered locally and never reach a backend, even
//! when a catch-all route is configured.

use axum::extract::State;

use crate::http::server::AppState;

/// Landing page.
pub async fn index(State(state): State<AppState>) -> String {
    state.pages.index.clone()
}

/// Generic error page.
pub async fn error(State(state): State<AppState>) -> String {
    state.pages.error.clone()
}
