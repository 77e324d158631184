// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pitwall event logger (`event-logger`)
//!
//! Second member of the per-event worker triplet: captures the event's
//! raw stream traffic into `RelayFrameLogs`, verbatim, for replay and
//! post-event diagnostics. Restart-safe: resumes from the last persisted
//! stream id.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use pw_bus::Bus;
use pw_core::{keys, Backoff};
use pw_processor::Config;
use pw_storage::Db;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid logger configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    info!(event_id = %config.event_id, "event logger starting");

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "event logger failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bus = Bus::connect(&config.redis_url).await?;
    let db = Db::connect(&config.database_url).await?;

    let key = keys::event_stream(config.event_id);
    let mut cursor = db
        .last_logged_stream_id(config.event_id)
        .await?
        .unwrap_or_else(|| "0".to_string());
    info!(%cursor, "resuming from last persisted stream id");

    let mut backoff = Backoff::bus();
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            batch = bus.stream_read(&key, &cursor, 128, 5_000) => match batch {
                Ok(entries) => {
                    backoff.reset();
                    for entry in entries {
                        for (field, payload) in &entry.fields {
                            if let Err(err) = db
                                .insert_frame_log(
                                    config.event_id,
                                    &entry.id,
                                    field,
                                    payload,
                                    chrono::Utc::now(),
                                )
                                .await
                            {
                                warn!(%err, stream_id = %entry.id, "frame log write failed");
                            }
                        }
                        cursor = entry.id;
                    }
                }
                Err(err) => {
                    let delay = backoff.next();
                    warn!(%err, ?delay, "stream read failed; backing off");
                    tokio::time::sleep(delay).await;
                }
            },

            _ = sigterm.recv() => {
                info!("SIGTERM received; stopping");
                return Ok(());
            },
        }
    }
}
