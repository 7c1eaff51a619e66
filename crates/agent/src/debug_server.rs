// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Introspection HTTP listener.
//!
//! Serves the active-job listing consumed by operational tooling. Session
//! lookup stays a library concern ([`AdmissionGate::find_session_by_url`]);
//! this listener never proxies session traffic.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use gantry_engine::AdmissionGate;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Version header for the job-list format.
const LIST_VERSION: &str = "2";

pub fn router(gate: Arc<AdmissionGate>) -> Router {
    Router::new()
        .route("/debug/jobs/list", get(list_jobs))
        .with_state(gate)
}

/// One `url=<job-url>` line per active job; an empty 200 when idle.
async fn list_jobs(State(gate): State<Arc<AdmissionGate>>) -> impl IntoResponse {
    let mut body = gate.list_active_jobs().join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    (
        [
            ("content-type", "text/plain"),
            ("x-list-version", LIST_VERSION),
        ],
        body,
    )
}

/// Bind and serve until the shutdown token fires.
pub async fn serve(
    address: &str,
    gate: Arc<AdmissionGate>,
    shutdown: CancellationToken,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(address = %listener.local_addr()?, "debug listener ready");
    axum::serve(listener, router(gate))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

#[cfg(test)]
#[path = "debug_server_tests.rs"]
mod tests;
