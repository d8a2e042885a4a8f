//! Admin API: read-only views plus a manual reconcile trigger.
//!
//! Served on its own address, behind a Bearer key.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::distribution::DistributionEngine;
use crate::lifecycle::Shutdown;
use crate::reconcile::ReconcileTrigger;

#[derive(Clone)]
pub struct AdminState {
    pub engine: Arc<DistributionEngine>,
    pub trigger: ReconcileTrigger,
    pub api_key: Arc<str>,
    pub started: Instant,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/snapshots", get(get_snapshots))
        .route("/admin/sessions", get(get_sessions))
        .route("/admin/reconcile", post(post_reconcile))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the admin router until shutdown.
pub async fn serve_admin(listener: TcpListener, router: Router, shutdown: Shutdown) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    let mut stop = shutdown.subscribe();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = stop.recv().await;
        })
        .await
}
