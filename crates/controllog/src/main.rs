// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pitwall control-log aggregator (`control-log`)
//!
//! Per-event worker polling the org's sanctioning source every minute and
//! fanning penalty/incident updates into the shared cache and toward
//! subscribers. Started by the orchestrator for orgs with a configured
//! control-log type.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use pw_bus::{Bus, ControlLogRequest};
use pw_controllog::{
    source, Aggregator, AggregatorError, BusLogSink, ControlLogMetrics, ControlLogSource,
};
use pw_core::{keys, EventId};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_secs(60);

struct Config {
    event_id: EventId,
    redis_url: String,
    control_log_type: String,
    control_log_url: String,
    health_addr: String,
}

impl Config {
    fn from_env() -> Result<Self, AggregatorError> {
        Ok(Self {
            event_id: EventId::new(parse_var("EVENT_ID")?),
            redis_url: require("REDIS_URL")?,
            control_log_type: require("CONTROL_LOG_TYPE")?,
            control_log_url: require("CONTROL_LOG_URL")?,
            health_addr: std::env::var("HEALTH_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8081".to_string()),
        })
    }
}

fn require(name: &'static str) -> Result<String, AggregatorError> {
    std::env::var(name).map_err(|_| AggregatorError::MissingEnv(name))
}

fn parse_var(name: &'static str) -> Result<i64, AggregatorError> {
    let value = require(name)?;
    value
        .parse()
        .map_err(|_| AggregatorError::InvalidEnv { name, value })
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid control-log configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    info!(
        event_id = %config.event_id,
        control_log_type = %config.control_log_type,
        "control-log aggregator starting"
    );

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "control-log aggregator failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bus = Bus::connect(&config.redis_url).await?;
    let metrics = Arc::new(ControlLogMetrics::default());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()?;
    let source: Box<dyn ControlLogSource> = source::create(
        &config.control_log_type,
        &config.control_log_url,
        client,
    )?;

    let mut aggregator = Aggregator::new(
        config.event_id,
        source,
        BusLogSink::new(bus.clone()),
        Arc::clone(&metrics),
    );

    // Health + metrics
    let router = Router::new()
        .route("/healthz/startup", get(ready))
        .route("/healthz/ready", get(ready))
        .route("/healthz/live", get(|| async { StatusCode::OK }))
        .route(
            "/metrics",
            get({
                let metrics = Arc::clone(&metrics);
                move || {
                    let metrics = Arc::clone(&metrics);
                    async move { metrics.render() }
                }
            }),
        )
        .with_state(bus.clone());
    let listener = tokio::net::TcpListener::bind(&config.health_addr).await?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!(%err, "health server stopped");
        }
    });

    // On-demand per-car requests
    let mut requests = bus
        .subscriber()
        .subscribe(vec![keys::SEND_CONTROL_LOG.to_string()]);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                if let Err(err) = aggregator.tick().await {
                    warn!(%err, "aggregation cycle failed");
                }
            },

            message = requests.recv() => match message {
                Some(message) => match serde_json::from_str::<ControlLogRequest>(&message.payload) {
                    Ok(request) => {
                        if let Err(err) = aggregator.on_request(&request).await {
                            warn!(%err, "on-demand control log push failed");
                        }
                    }
                    Err(err) => warn!(%err, "unreadable control log request"),
                },
                None => warn!("request subscription ended"),
            },

            _ = sigterm.recv() => {
                info!("SIGTERM received; stopping");
                return Ok(());
            },
        }
    }
}

async fn ready(State(bus): State<Bus>) -> StatusCode {
    if bus.ping().await.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
