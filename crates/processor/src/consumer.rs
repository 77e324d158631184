// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus stream consumer.
//!
//! Reads the per-event stream in strict arrival order and feeds the
//! pipeline through a bounded channel; back-pressure falls out of the
//! channel bound (the next batch is not pulled while the pipeline is
//! behind). On restart the cursor begins at the stream head, replaying the
//! event so the in-memory state rebuilds; patches being idempotent makes
//! that safe for subscribers.

use crate::metrics::ProcessorMetrics;
use pw_bus::{Bus, StreamEntry};
use pw_codecs::StreamEnvelope;
use pw_core::{keys, Backoff, EventId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Entries pulled per XREAD.
const BATCH: usize = 64;

/// Blocking read window; also bounds shutdown latency of the task.
const BLOCK_MS: u64 = 5_000;

/// Run until the receiving side hangs up.
pub async fn consume(
    bus: Bus,
    event: EventId,
    tx: mpsc::Sender<StreamEnvelope>,
    metrics: Arc<ProcessorMetrics>,
) {
    let key = keys::event_stream(event);
    let mut cursor = "0".to_string();
    let mut backoff = Backoff::bus();

    loop {
        match bus.stream_read(&key, &cursor, BATCH, BLOCK_MS).await {
            Ok(entries) => {
                backoff.reset();
                for entry in entries {
                    cursor = entry.id.clone();
                    for envelope in decode_entry(&entry) {
                        if tx.send(envelope).await.is_err() {
                            debug!("pipeline gone; consumer stopping");
                            return;
                        }
                    }
                }
            }
            Err(err) => {
                metrics.bus_reconnects.incr();
                let delay = backoff.next();
                warn!(%err, ?delay, "stream read failed; backing off");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Expand one stream entry into pipeline envelopes.
///
/// RMonitor rides under its `rmon-{event}-{session}` field (one or more
/// CRLF records per entry), Multiloop under `mloop-{event}-{session}` as
/// base64, and everything else as a JSON envelope under `message`.
pub fn decode_entry(entry: &StreamEntry) -> Vec<StreamEnvelope> {
    let mut envelopes = Vec::new();
    for (field, value) in &entry.fields {
        if let Some(session_id) = session_of(field, "rmon-") {
            for line in value.lines() {
                let line = line.trim_end_matches('\r');
                if !line.is_empty() {
                    envelopes.push(StreamEnvelope::RMonitor {
                        session_id,
                        line: line.to_string(),
                    });
                }
            }
        } else if let Some(session_id) = session_of(field, "mloop-") {
            match pw_bus::decode_b64(value) {
                Some(frame) => envelopes.push(StreamEnvelope::Multiloop { session_id, frame }),
                None => warn!(field, "dropping undecodable multiloop entry"),
            }
        } else if field == "message" {
            match serde_json::from_str(value) {
                Ok(envelope) => envelopes.push(envelope),
                Err(err) => warn!(%err, "dropping unreadable stream message"),
            }
        } else {
            debug!(field, "ignoring unknown stream field");
        }
    }
    envelopes
}

fn session_of(field: &str, prefix: &str) -> Option<u32> {
    let rest = field.strip_prefix(prefix)?;
    let (_event, session) = rest.split_once('-')?;
    session.parse().ok()
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
