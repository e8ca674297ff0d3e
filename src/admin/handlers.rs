use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::routing::Route;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
}

#[derive(Debug, Serialize)]
pub struct RouteStatus {
    pub name: String,
    pub prefix: String,
    pub backend_url: String,
    pub strip_prefix: bool,
}

impl From<&Route> for RouteStatus {
    fn from(route: &Route) -> Self {
        Self {
            name: route.name.clone(),
            prefix: route.prefix().to_string(),
            backend_url: route.backend.to_string(),
            strip_prefix: route.strip_prefix,
        }
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.table.load().len(),
    })
}

/// Routes in match order, most specific first.
pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteStatus>> {
    let table = state.table.load();
    Json(table.routes().iter().map(RouteStatus::from).collect())
}
