use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::load_balancer::EndpointStatus;
use crate::net::PoolStats;
use crate::observability::MetricsSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: usize,
    pub healthy_endpoints: usize,
    pub pool: PoolStats,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub endpoint: String,
    pub reset: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let endpoints = state.ambassador.endpoint_status();
    let healthy = endpoints.iter().filter(|e| e.healthy).count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if healthy == 0 { "degraded" } else { "operational" },
        endpoints: endpoints.len(),
        healthy_endpoints: healthy,
        pool: state.ambassador.pool_stats(),
    })
}

pub async fn get_endpoints(State(state): State<AdminState>) -> Json<Vec<EndpointStatus>> {
    Json(state.ambassador.endpoint_status())
}

pub async fn get_metrics(State(state): State<AdminState>) -> Json<MetricsSnapshot> {
    Json(state.ambassador.metrics())
}

pub async fn reset_endpoint(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<ResetResponse>, StatusCode> {
    if state.ambassador.reset_endpoint(&name) {
        Ok(Json(ResetResponse { endpoint: name, reset: true }))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
