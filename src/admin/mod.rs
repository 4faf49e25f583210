//! Admin API.
//!
//! # Endpoints
//! - `GET /admin/status`: version, endpoint health summary, pool occupancy
//! - `GET /admin/endpoints`: per-endpoint status
//! - `GET /admin/metrics`: collector snapshot
//! - `POST /admin/endpoints/{name}/reset`: force-close one breaker
//!
//! Every route requires `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::ambassador::Ambassador;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub ambassador: Arc<Ambassador>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(ambassador: Arc<Ambassador>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            ambassador,
            api_key: api_key.into(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/endpoints", get(get_endpoints))
        .route("/admin/endpoints/{name}/reset", post(reset_endpoint))
        .route("/admin/metrics", get(get_metrics))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin router until `shutdown` fires.
pub async fn serve(listener: TcpListener, state: AdminState, shutdown: CancellationToken) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Admin API listening");
    }
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}
