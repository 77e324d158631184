// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health, metrics and read-only state sampling over HTTP.
//!
//! `/healthz/startup` and `/healthz/ready` probe the bus and database;
//! `/healthz/live` only asserts the pipeline loop is still turning.
//! `/state` samples the authoritative state under a read lock for admin
//! tooling.

use crate::metrics::ProcessorMetrics;
use crate::state::StateHandle;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use pw_bus::Bus;
use pw_storage::Db;
use std::sync::Arc;

/// How stale the pipeline loop stamp may be before liveness fails.
const LIVE_STALE_MS: u64 = 30_000;

#[derive(Clone)]
pub struct HealthState {
    pub bus: Bus,
    pub db: Db,
    pub state: StateHandle,
    pub metrics: Arc<ProcessorMetrics>,
}

pub fn router(health: HealthState) -> Router {
    Router::new()
        .route("/healthz/startup", get(ready))
        .route("/healthz/ready", get(ready))
        .route("/healthz/live", get(live))
        .route("/state", get(state_sample))
        .route("/metrics", get(metrics))
        .with_state(health)
}

async fn ready(State(health): State<HealthState>) -> StatusCode {
    let bus_ok = health.bus.ping().await.is_ok();
    let db_ok = health.db.ping().await.is_ok();
    if bus_ok && db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn live(State(health): State<HealthState>) -> StatusCode {
    let last = health.metrics.last_loop_ms();
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    if last == 0 || now.saturating_sub(last) < LIVE_STALE_MS {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn state_sample(State(health): State<HealthState>) -> Json<pw_core::SessionState> {
    Json(health.state.snapshot())
}

async fn metrics(State(health): State<HealthState>) -> String {
    health.metrics.render()
}
