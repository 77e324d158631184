// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pitwall event processor (`event-processor`)
//!
//! Per-event worker: the single reader of the event's bus stream and the
//! single writer of its session state. Started by the orchestrator with
//! the event's identity in the environment.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use pw_bus::{Bus, SnapshotRequest};
use pw_codecs::StreamEnvelope;
use pw_core::{keys, EventId, SessionId, SystemClock, RESERVED_SESSION_ID};
use pw_processor::broadcast::BusPatchSink;
use pw_processor::caches::BusCaches;
use pw_processor::health::{self, HealthState};
use pw_processor::{consumer, Config, Pipeline, ProcessorMetrics, StateHandle};
use pw_storage::Db;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Full snapshot cadence (also drives the penalty fold).
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(5);

/// Driver-cache sweep cadence.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Drain budget after a pre-shutdown signal.
const DRAIN_WINDOW: Duration = Duration::from_secs(15);

/// How long the drain waits on an idle channel before declaring it dry.
const DRAIN_QUIET: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid processor configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    info!(
        event_id = %config.event_id,
        org_id = %config.org_id,
        path_base = %config.path_base,
        "event processor starting"
    );

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "event processor failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bus = Bus::connect(&config.redis_url).await?;
    let db = Db::connect(&config.database_url).await?;
    let metrics = Arc::new(ProcessorMetrics::default());

    let state = StateHandle::new(config.event_id, SessionId::new(RESERVED_SESSION_ID));
    let caches = Arc::new(BusCaches::new(bus.clone()));
    let mut pipeline = Pipeline::new(
        config.event_id,
        state.clone(),
        Arc::new(db.clone()),
        Arc::clone(&caches),
        Arc::clone(&caches),
        Arc::new(BusPatchSink::new(bus.clone(), config.event_id)),
        SystemClock,
        Arc::clone(&metrics),
    );

    // Health/metrics/state endpoints
    let router = health::router(HealthState {
        bus: bus.clone(),
        db: db.clone(),
        state,
        metrics: Arc::clone(&metrics),
    });
    let listener = tokio::net::TcpListener::bind(&config.health_addr).await?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!(%err, "health server stopped");
        }
    });

    // Stream consumer feeding the bounded pipeline channel
    let (tx, mut rx) = mpsc::channel::<StreamEnvelope>(64);
    tokio::spawn(consumer::consume(
        bus.clone(),
        config.event_id,
        tx,
        Arc::clone(&metrics),
    ));

    // Control channels: pre-shutdown fan-out and snapshot fan-in requests
    let mut shutdown_signals = bus.subscriber().subscribe(vec![
        keys::EVENT_SHUTDOWN_SIGNAL.to_string(),
        keys::SEND_FULL_STATUS.to_string(),
    ]);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut snapshot_timer = tokio::time::interval(SNAPSHOT_INTERVAL);
    snapshot_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut sweep_timer = tokio::time::interval(SWEEP_INTERVAL);
    sweep_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            envelope = rx.recv() => match envelope {
                Some(envelope) => {
                    if let Err(err) = pipeline.handle(envelope).await {
                        warn!(%err, "frame handling failed; continuing");
                    }
                }
                None => {
                    warn!("stream consumer ended");
                    break;
                }
            },

            _ = snapshot_timer.tick() => {
                if let Err(err) = pipeline.snapshot_tick().await {
                    warn!(%err, "snapshot publish failed");
                }
                if let Err(err) = pipeline.penalty_tick().await {
                    warn!(%err, "penalty fold failed");
                }
            },

            _ = sweep_timer.tick() => {
                if let Err(err) = pipeline.sweep_tick().await {
                    warn!(%err, "driver sweep failed");
                }
            },

            message = shutdown_signals.recv() => match message {
                Some(message) if message.channel == keys::EVENT_SHUTDOWN_SIGNAL => {
                    if shutdown_is_for(&message.payload, config.event_id) {
                        info!("pre-shutdown signal received; draining");
                        drain(&mut pipeline, &mut rx).await;
                        return Ok(());
                    }
                }
                Some(message) => {
                    // SEND_FULL_STATUS fan-in
                    match serde_json::from_str::<SnapshotRequest>(&message.payload) {
                        Ok(request) if request.event_id == config.event_id => {
                            if let Err(err) =
                                pipeline.snapshot_for_connection(request.connection_id).await
                            {
                                warn!(%err, "targeted snapshot failed");
                            }
                        }
                        Ok(_) => {}
                        Err(err) => warn!(%err, "unreadable snapshot request"),
                    }
                }
                None => warn!("control subscription ended"),
            },

            _ = sigterm.recv() => {
                info!("SIGTERM received; draining");
                drain(&mut pipeline, &mut rx).await;
                return Ok(());
            },
        }
    }

    Ok(())
}

fn shutdown_is_for(payload: &str, event: EventId) -> bool {
    match serde_json::from_str::<Vec<EventId>>(payload) {
        Ok(events) => events.contains(&event),
        Err(err) => {
            warn!(%err, "unreadable shutdown signal");
            false
        }
    }
}

/// Consume in-flight frames for up to the drain window, then finalize a
/// checkered session and flush the last snapshot.
async fn drain<S, D, P, K, C>(
    pipeline: &mut Pipeline<S, D, P, K, C>,
    rx: &mut mpsc::Receiver<StreamEnvelope>,
) where
    S: pw_processor::SessionStore + 'static,
    D: pw_processor::DriverCache,
    P: pw_processor::PenaltyCache,
    K: pw_processor::PatchSink,
    C: pw_core::Clock + Clone + 'static,
{
    let deadline = tokio::time::Instant::now() + DRAIN_WINDOW;
    loop {
        let quiet = tokio::time::timeout(DRAIN_QUIET, rx.recv());
        match tokio::time::timeout_at(deadline, quiet).await {
            Ok(Ok(Some(envelope))) => {
                if let Err(err) = pipeline.handle(envelope).await {
                    warn!(%err, "frame handling failed during drain");
                }
            }
            // Channel quiet or closed, or the window elapsed: stop draining
            Ok(Ok(None)) | Ok(Err(_)) | Err(_) => break,
        }
    }

    if let Err(err) = pipeline.shutdown().await {
        warn!(%err, "shutdown flush failed");
    }
    info!("drain complete");
}
