// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pitwall push hub (`push-hub`)
//!
//! The duplex channel between trackside relays, UI clients and the
//! per-event workers.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use pw_bus::Bus;
use pw_core::SystemClock;
use pw_hub::bridge::BridgeManager;
use pw_hub::commands::CommandHandler;
use pw_hub::ports::BusDbPorts;
use pw_hub::server::{self, AppState};
use pw_hub::{HubError, Registry};
use pw_storage::Db;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

struct Config {
    redis_url: String,
    database_url: String,
    jwt_secret: String,
    listen_addr: String,
    path_base: String,
}

impl Config {
    fn from_env() -> Result<Self, HubError> {
        Ok(Self {
            redis_url: require("REDIS_URL")?,
            database_url: require("DATABASE_URL")?,
            jwt_secret: require("JWT_SECRET")?,
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            path_base: std::env::var("PATH_BASE").unwrap_or_else(|_| "/status".to_string()),
        })
    }
}

fn require(name: &'static str) -> Result<String, HubError> {
    std::env::var(name).map_err(|_| HubError::MissingEnv(name))
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid hub configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    info!(listen = %config.listen_addr, path_base = %config.path_base, "push hub starting");

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "push hub failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bus = Bus::connect(&config.redis_url).await?;
    let db = Db::connect(&config.database_url).await?;

    let registry = Arc::new(Registry::new());
    let handler = Arc::new(CommandHandler::new(
        Arc::new(BusDbPorts::new(bus.clone(), db.clone())),
        Arc::clone(&registry),
        SystemClock,
    ));
    let bridges = Arc::new(BridgeManager::new());

    let state = AppState {
        handler,
        bridges: Arc::clone(&bridges),
        bus,
        db,
        jwt_secret: config.jwt_secret,
    };
    let router = server::router(state, &config.path_base);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = axum::serve(listener, router) => {
            result?;
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received; closing connections");
            bridges.shutdown();
        }
    }
    Ok(())
}
