// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pitwall orchestrator (`orchestrator`)
//!
//! Singleton control plane: watches relay heartbeats and keeps one worker
//! triplet running per live event. Env-driven, no CLI.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use pw_bus::Bus;
use pw_core::SystemClock;
use pw_orchestrator::scan::{BusDbScanPorts, WorkerEnv};
use pw_orchestrator::{Orchestrator, OrchestratorError, ProcessDriver};
use pw_storage::Db;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

const SCAN_INTERVAL: Duration = Duration::from_secs(10);

struct Config {
    redis_url: String,
    database_url: String,
    worker_bin_dir: String,
    control_log_url_base: String,
    health_addr: String,
}

impl Config {
    fn from_env() -> Result<Self, OrchestratorError> {
        Ok(Self {
            redis_url: require("REDIS_URL")?,
            database_url: require("DATABASE_URL")?,
            worker_bin_dir: require("WORKER_BIN_DIR")?,
            control_log_url_base: std::env::var("CONTROL_LOG_URL_BASE")
                .unwrap_or_else(|_| "http://controllog-scrapers".to_string()),
            health_addr: std::env::var("HEALTH_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8082".to_string()),
        })
    }
}

fn require(name: &'static str) -> Result<String, OrchestratorError> {
    std::env::var(name).map_err(|_| OrchestratorError::MissingEnv(name))
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid orchestrator configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    info!(bin_dir = %config.worker_bin_dir, "orchestrator starting");

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "orchestrator failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bus = Bus::connect(&config.redis_url).await?;
    let db = Db::connect(&config.database_url).await?;

    let orchestrator = Orchestrator::new(
        BusDbScanPorts::new(bus.clone(), db.clone()),
        ProcessDriver::new(&config.worker_bin_dir),
        SystemClock,
        WorkerEnv {
            database_url: config.database_url.clone(),
            redis_url: config.redis_url.clone(),
            control_log_url_base: config.control_log_url_base.clone(),
        },
    );

    let router = Router::new()
        .route("/healthz/startup", get(ready))
        .route("/healthz/ready", get(ready))
        .route("/healthz/live", get(|| async { StatusCode::OK }))
        .with_state((bus, db));
    let listener = tokio::net::TcpListener::bind(&config.health_addr).await?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!(%err, "health server stopped");
        }
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut scan = tokio::time::interval(SCAN_INTERVAL);
    scan.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = scan.tick() => {
                if let Err(err) = orchestrator.pass().await {
                    warn!(%err, "orchestration pass failed");
                }
            },
            _ = sigterm.recv() => {
                info!("SIGTERM received; stopping");
                return Ok(());
            },
        }
    }
}

async fn ready(State((bus, db)): State<(Bus, Db)>) -> StatusCode {
    if bus.ping().await.is_ok() && db.ping().await.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
