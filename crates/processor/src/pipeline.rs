// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-event pipeline: decode → aggregate → enrich → broadcast →
//! persist.
//!
//! One cooperative task drives `handle()` in stream order; the snapshot,
//! sweep and penalty ticks run from the same task's select loop. The
//! session-state write lock is held only while applying a record, never
//! across I/O; snapshots serialize from a clone taken under a read lock.
//!
//! Payload errors never end the pipeline. Infrastructure errors bubble to
//! the caller, which logs and keeps consuming.

use crate::aggregate::Aggregator;
use crate::broadcast::PatchSink;
use crate::caches::{DriverCache, PenaltyCache};
use crate::enricher;
use crate::metrics::ProcessorMetrics;
use crate::monitor::{MonitorEvent, SessionMonitor};
use crate::penalties;
use crate::state::StateHandle;
use crate::store::SessionStore;
use crate::PipelineError;
use pw_bus::{encode_b64, PatchMessage};
use pw_codecs::rmonitor::RMonitorRecord;
use pw_codecs::{StreamEnvelope, WireRecord};
use pw_core::{snapshot, Clock, Debouncer, DriverInfo, EventId, SessionId, SessionState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Attempts per lap row before it is dropped.
const LAP_LOG_ATTEMPTS: u32 = 3;

/// `Sessions.last_updated` write coalescing window.
const TOUCH_DEBOUNCE: Duration = Duration::from_millis(1500);

pub struct Pipeline<S, D, P, K, C>
where
    S: SessionStore + 'static,
    D: DriverCache,
    P: PenaltyCache,
    K: PatchSink,
    C: Clock + Clone,
{
    event_id: EventId,
    state: StateHandle,
    /// Prior session's terminal state, kept until its result row lands.
    previous: Option<SessionState>,
    aggregator: Aggregator,
    monitor: SessionMonitor<C>,
    store: Arc<S>,
    drivers: Arc<D>,
    penalty_cache: Arc<P>,
    sink: Arc<K>,
    clock: C,
    metrics: Arc<ProcessorMetrics>,
    touch: Debouncer,
    finalized_tx: broadcast::Sender<SessionId>,
}

impl<S, D, P, K, C> Pipeline<S, D, P, K, C>
where
    S: SessionStore + 'static,
    D: DriverCache,
    P: PenaltyCache,
    K: PatchSink,
    C: Clock + Clone + 'static,
{
    pub fn new(
        event_id: EventId,
        state: StateHandle,
        store: Arc<S>,
        drivers: Arc<D>,
        penalty_cache: Arc<P>,
        sink: Arc<K>,
        clock: C,
        metrics: Arc<ProcessorMetrics>,
    ) -> Self {
        let (finalized_tx, _) = broadcast::channel(16);

        let touch = {
            let store = Arc::clone(&store);
            let state = state.clone();
            let clock = clock.clone();
            Debouncer::spawn(TOUCH_DEBOUNCE, move || {
                let store = Arc::clone(&store);
                let (event, session) = state.read(|s| (s.event_id, s.session_id));
                let now = clock.now();
                async move {
                    if session.is_reserved() {
                        return;
                    }
                    if let Err(err) = store.touch_session(event, session, now).await {
                        debug!(%err, "session touch failed");
                    }
                }
            })
        };

        Self {
            event_id,
            state,
            previous: None,
            aggregator: Aggregator::new(),
            monitor: SessionMonitor::new(clock.clone()),
            store,
            drivers,
            penalty_cache,
            sink,
            clock,
            metrics,
            touch,
            finalized_tx,
        }
    }

    /// Local `FinalizedSession` events for in-process listeners.
    pub fn subscribe_finalized(&self) -> broadcast::Receiver<SessionId> {
        self.finalized_tx.subscribe()
    }

    pub fn state(&self) -> StateHandle {
        self.state.clone()
    }

    /// Terminal state of the previously adopted session, if any.
    pub fn previous_session(&self) -> Option<&SessionState> {
        self.previous.as_ref()
    }

    /// Consume one stream entry in arrival order.
    pub async fn handle(&mut self, envelope: StreamEnvelope) -> Result<(), PipelineError> {
        self.metrics.frames_total.incr();
        self.metrics
            .mark_loop(self.clock.now().timestamp_millis().max(0) as u64);

        let record = match envelope.decode() {
            Ok(record) => record,
            Err(err) => {
                self.metrics.decode_failures.incr();
                warn!(%err, "dropping undecodable frame");
                return Ok(());
            }
        };

        match record {
            WireRecord::SessionChange {
                session_id,
                session_name,
                ..
            } => {
                self.on_session_change(SessionId::new(session_id), &session_name)
                    .await?;
            }

            WireRecord::DriverInfo(info) => {
                let patch = self
                    .state
                    .write(|state| enricher::apply_driver_info(state, &info));
                if let Some(patch) = patch {
                    self.publish(PatchMessage::Cars {
                        patches: vec![patch],
                        published_at_ms: self.now_ms(),
                    })
                    .await?;
                }
            }

            WireRecord::Reset => {
                self.state.write(|state| state.clear_cars());
                let published_at_ms = self.now_ms();
                self.publish(PatchMessage::Reset { published_at_ms }).await?;
            }

            record @ (WireRecord::RMonitor(_) | WireRecord::Multiloop(_)) => {
                self.on_timing_record(record).await?;
            }
        }

        self.touch.call();
        Ok(())
    }

    async fn on_timing_record(&mut self, record: WireRecord) -> Result<(), PipelineError> {
        let is_heartbeat = matches!(
            record,
            WireRecord::RMonitor(RMonitorRecord::Heartbeat(_))
        );

        let now = self.clock.now();
        let aggregator = &mut self.aggregator;
        let monitor = &mut self.monitor;
        let (effects, monitor_events) = self.state.write(|state| {
            let effects = aggregator.apply(state, &record, now);
            let events = if is_heartbeat {
                monitor.on_time_tick(state)
            } else {
                monitor.observe_frame(state)
            };
            (effects, events)
        });

        if effects.unsupported {
            self.metrics.unsupported_multiloop.incr();
        }

        if effects.reset {
            let published_at_ms = self.now_ms();
            self.publish(PatchMessage::Reset { published_at_ms }).await?;
        }

        if let Some(patch) = effects.session_patch {
            let published_at_ms = self.now_ms();
            self.publish(PatchMessage::Session {
                patch,
                published_at_ms,
            })
            .await?;
        }

        if !effects.car_patches.is_empty() {
            let published_at_ms = self.now_ms();
            self.publish(PatchMessage::Cars {
                patches: effects.car_patches,
                published_at_ms,
            })
            .await?;
        }

        if let Some(flag) = effects.flag_change {
            if let Some(session) = self.monitor.current_session() {
                if let Err(err) = self
                    .store
                    .insert_flag(self.event_id, session, flag, now)
                    .await
                {
                    warn!(%err, %flag, "flag log write failed");
                }
            }
        }

        for lap in effects.laps {
            self.persist_lap(lap).await;
        }

        self.apply_monitor_events(monitor_events).await?;
        Ok(())
    }

    async fn on_session_change(
        &mut self,
        session: SessionId,
        session_name: &str,
    ) -> Result<(), PipelineError> {
        if session.is_reserved() {
            warn!(%session, "ignoring session change with reserved id");
            return Ok(());
        }

        let events = self.monitor.on_session_change(session);
        for event in events {
            match event {
                MonitorEvent::SessionFinalized { session } => {
                    // State still holds the prior session here
                    self.finalize(session).await?;
                }
                MonitorEvent::SessionStarted { session } => {
                    info!(%session, session_name, "adopting new session");
                    let mut fresh = SessionState::new(self.event_id, session);
                    fresh.session_name = session_name.to_string();
                    fresh.is_live = true;
                    self.aggregator.reset();
                    self.previous = Some(self.state.replace(fresh));
                    self.publish_snapshot(None).await?;
                }
            }
        }
        Ok(())
    }

    async fn apply_monitor_events(
        &mut self,
        events: Vec<MonitorEvent>,
    ) -> Result<(), PipelineError> {
        for event in events {
            match event {
                MonitorEvent::SessionFinalized { session } => self.finalize(session).await?,
                MonitorEvent::SessionStarted { .. } => {}
            }
        }
        Ok(())
    }

    /// Terminal persistence: not-live patch, result row, local event.
    async fn finalize(&mut self, session: SessionId) -> Result<(), PipelineError> {
        let now = self.clock.now();
        let terminal = self.state.write(|state| {
            if state.session_id == session {
                state.is_live = false;
            }
            state.clone()
        });

        let control_logs = match self.penalty_cache.full_logs(self.event_id).await {
            Ok(logs) => logs,
            Err(err) => {
                warn!(%err, "control logs unavailable at finalize");
                Vec::new()
            }
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .store
                .finalize_session(self.event_id, session, &terminal, &control_logs, now)
                .await
            {
                Ok(()) => break,
                Err(err) if attempt < 3 => {
                    warn!(%err, attempt, "finalize write failed; retrying");
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
                Err(err) => {
                    error!(%err, %session, "finalize write failed; giving up");
                    return Err(err.into());
                }
            }
        }

        let mut patch = pw_core::SessionStatePatch::new(session);
        patch.is_live = Some(false);
        let published_at_ms = self.now_ms();
        self.publish(PatchMessage::Session {
            patch,
            published_at_ms,
        })
        .await?;

        let _ = self.finalized_tx.send(session);
        info!(%session, "session finalized");
        Ok(())
    }

    async fn persist_lap(&self, lap: crate::aggregate::LapCompletion) {
        let session = match self.monitor.current_session() {
            Some(session) => session,
            None => self.state.read(|s| s.session_id),
        };
        let now = self.clock.now();
        for attempt in 1..=LAP_LOG_ATTEMPTS {
            match self
                .store
                .insert_lap(self.event_id, session, &lap, now)
                .await
            {
                Ok(()) => return,
                Err(err) if attempt < LAP_LOG_ATTEMPTS => {
                    debug!(%err, attempt, car = %lap.car_number, "lap write failed; retrying");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Err(err) => {
                    self.metrics.lap_log_failures.incr();
                    warn!(
                        %err,
                        car = %lap.car_number,
                        lap = lap.lap_number,
                        "lap write failed; dropping (state still reflects the lap)"
                    );
                }
            }
        }
    }

    /// 5 s cadence: serialize under a read lock, publish to the group and
    /// refresh the snapshot cache.
    pub async fn snapshot_tick(&self) -> Result<(), PipelineError> {
        self.publish_snapshot(None).await
    }

    /// Targeted snapshot for a freshly subscribed connection.
    pub async fn snapshot_for_connection(
        &self,
        connection_id: String,
    ) -> Result<(), PipelineError> {
        self.publish_snapshot(Some(connection_id)).await
    }

    async fn publish_snapshot(&self, connection_id: Option<String>) -> Result<(), PipelineError> {
        let state = self.state.snapshot();
        let msgpack = snapshot::to_msgpack(&state)?;
        let legacy = snapshot::to_gzip_json(&state)?;

        let broadcasting = connection_id.is_none();
        self.sink
            .publish(&PatchMessage::FullStatus {
                snapshot_b64: encode_b64(&msgpack),
                legacy_gzip_b64: encode_b64(&legacy),
                published_at_ms: self.now_ms(),
                connection_id,
            })
            .await?;
        if broadcasting {
            self.sink.cache_snapshot(&msgpack).await?;
        }
        self.metrics.snapshots_published.incr();
        Ok(())
    }

    /// 60 s cadence: clear driver assignments the cache no longer backs.
    pub async fn sweep_tick(&mut self) -> Result<(), PipelineError> {
        let cars: Vec<(String, u32)> = self
            .state
            .read(|s| s.car_positions.iter().map(|c| (c.number.clone(), c.transponder_id)).collect());

        let mut cache: HashMap<String, DriverInfo> = HashMap::new();
        for (number, transponder) in cars {
            match self.drivers.lookup(self.event_id, &number, transponder).await {
                Ok(Some(info)) => {
                    cache.insert(number, info);
                }
                Ok(None) => {}
                Err(err) => {
                    // Do not clear drivers on cache trouble; skip the sweep
                    warn!(%err, "driver cache unavailable; skipping sweep");
                    return Ok(());
                }
            }
        }

        let patches = self.state.write(|state| enricher::sweep(state, &cache));
        if !patches.is_empty() {
            let published_at_ms = self.now_ms();
            self.publish(PatchMessage::Cars {
                patches,
                published_at_ms,
            })
            .await?;
        }
        Ok(())
    }

    /// Fold the penalty hash into car state; runs on the snapshot cadence.
    pub async fn penalty_tick(&mut self) -> Result<(), PipelineError> {
        let snapshot = match self.penalty_cache.penalties(self.event_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%err, "penalty cache unavailable");
                return Ok(());
            }
        };

        let patches = self
            .state
            .write(|state| penalties::apply_penalties(state, &snapshot));
        if !patches.is_empty() {
            let published_at_ms = self.now_ms();
            self.publish(PatchMessage::Cars {
                patches,
                published_at_ms,
            })
            .await?;
        }
        Ok(())
    }

    /// Pre-shutdown: finalize a checkered session and flush one last
    /// snapshot so subscribers and caches end consistent.
    pub async fn shutdown(&mut self) -> Result<(), PipelineError> {
        let events = {
            let monitor = &mut self.monitor;
            self.state.read(|state| monitor.finalize_if_checkered(state))
        };
        self.apply_monitor_events(events).await?;
        self.publish_snapshot(None).await
    }

    async fn publish(&self, message: PatchMessage) -> Result<(), PipelineError> {
        self.sink.publish(&message).await?;
        self.metrics.patches_published.incr();
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.clock.now().timestamp_millis().max(0) as u64
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
