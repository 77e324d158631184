// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: the WebSocket endpoint under the path base, plus health
//! and metrics.

use crate::auth;
use crate::bridge::BridgeManager;
use crate::commands::ConnectionContext;
use crate::connection::{run_connection, ProdHandler};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use pw_bus::Bus;
use pw_core::metrics::Exposition;
use pw_storage::Db;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<ProdHandler>,
    pub bridges: Arc<BridgeManager>,
    pub bus: Bus,
    pub db: Db,
    pub jwt_secret: String,
}

pub fn router(state: AppState, path_base: &str) -> Router {
    Router::new()
        .route(path_base, get(ws_upgrade))
        .route("/healthz/startup", get(ready))
        .route("/healthz/ready", get(ready))
        .route("/healthz/live", get(|| async { StatusCode::OK }))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let token = bearer_token(&headers)
        .or_else(|| params.get("access_token").cloned());
    let Some(token) = token else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let claims = match auth::validate(&token, &state.jwt_secret) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(%err, "rejecting connection with invalid token");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let ctx = ConnectionContext {
        connection_id: uuid::Uuid::new_v4().to_string(),
        claims,
        relay_version: params.get("relay_version").cloned().unwrap_or_default(),
    };

    ws.on_upgrade(move |socket| {
        run_connection(
            socket,
            ctx,
            Arc::clone(&state.handler),
            state.bus.clone(),
            Arc::clone(&state.bridges),
        )
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

async fn ready(State(state): State<AppState>) -> StatusCode {
    let bus_ok = state.bus.ping().await.is_ok();
    let db_ok = state.db.ping().await.is_ok();
    if bus_ok && db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(State(state): State<AppState>) -> String {
    Exposition::new()
        .gauge(
            "hub_connections",
            "Currently connected clients",
            state.handler.registry().connection_count() as u64,
        )
        .render()
}
