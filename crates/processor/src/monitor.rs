// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle monitor.
//!
//! Tracks `Idle → Active → Finishing → Finalized` per session, driven by
//! session-change messages and observed state after each frame. Time
//! inside a session comes from the timing system's own clock (the parsed
//! `local_time_of_day`), never the wall clock, so replayed and simulated
//! events finalize identically.
//!
//! Finishing starts when a racing flag goes checkered. Finalization fires
//! when either 60 s of event time pass without any car advancing past its
//! checkered lap count, or the event clock stops advancing between
//! heartbeats.

use pw_core::{parse_clock_ms, Clock, Flag, SessionId, SessionState};
use std::collections::HashMap;
use tracing::{debug, info};

/// Event time a session may sit finishing without progress before it
/// finalizes.
const FINISH_SETTLE_MS: u64 = 60_000;

/// What a monitor step decided; the pipeline performs the I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A new session took over (non-reserved id).
    SessionStarted { session: SessionId },
    /// The tracked session is done: persist its result, mark not-live.
    SessionFinalized { session: SessionId },
}

#[derive(Debug)]
enum Phase {
    Idle,
    Active,
    Finishing {
        checkered_laps: HashMap<String, u32>,
        last_change_event_ms: u64,
    },
}

pub struct SessionMonitor<C: Clock> {
    clock: C,
    phase: Phase,
    current: Option<SessionId>,
    prev_flag: Flag,
    prev_event_ms: Option<u64>,
}

impl<C: Clock> SessionMonitor<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            phase: Phase::Idle,
            current: None,
            prev_flag: Flag::Unknown,
            prev_event_ms: None,
        }
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.current
    }

    /// Wall-clock "now" for persistence timestamps.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// A session-change message arrived. Reserved ids never start or end
    /// anything.
    pub fn on_session_change(&mut self, session: SessionId) -> Vec<MonitorEvent> {
        if session.is_reserved() {
            debug!(%session, "ignoring reserved session id");
            return Vec::new();
        }
        if self.current == Some(session) {
            return Vec::new();
        }

        let mut events = Vec::new();
        if let Some(prior) = self.current {
            info!(%prior, %session, "session changed; finalizing prior session");
            events.push(MonitorEvent::SessionFinalized { session: prior });
        }
        self.phase = Phase::Active;
        self.current = Some(session);
        self.prev_flag = Flag::Unknown;
        self.prev_event_ms = None;
        events.push(MonitorEvent::SessionStarted { session });
        events
    }

    /// Observe the state after a non-heartbeat frame: only lap progress
    /// matters here.
    pub fn observe_frame(&mut self, state: &SessionState) -> Vec<MonitorEvent> {
        self.note_lap_progress(state);
        Vec::new()
    }

    /// Observe the state after a timing-system heartbeat: flag
    /// transitions, the settle countdown and clock-stall detection.
    pub fn on_time_tick(&mut self, state: &SessionState) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        let event_ms = parse_clock_ms(&state.local_time_of_day);

        // Racing flag going checkered starts the finish countdown
        if matches!(self.phase, Phase::Active)
            && self.prev_flag.is_racing()
            && state.current_flag == Flag::Checkered
        {
            let started = event_ms.unwrap_or_default();
            info!(
                session = %state.session_id,
                finishing_started_ms = started,
                "checkered flag observed; session finishing"
            );
            self.phase = Phase::Finishing {
                checkered_laps: state
                    .car_positions
                    .iter()
                    .map(|c| (c.number.clone(), c.last_lap_completed))
                    .collect(),
                last_change_event_ms: started,
            };
        }

        self.note_lap_progress(state);

        let last_change = match &self.phase {
            Phase::Finishing { last_change_event_ms, .. } => Some(*last_change_event_ms),
            _ => None,
        };
        if let (Some(last_change), Some(now_ms)) = (last_change, event_ms) {
            let settled = now_ms.saturating_sub(last_change) >= FINISH_SETTLE_MS;
            let stalled = self.prev_event_ms == Some(now_ms);
            if settled || stalled {
                if let Some(session) = self.current.take() {
                    info!(%session, settled, stalled, "finalizing session");
                    events.push(MonitorEvent::SessionFinalized { session });
                }
                self.phase = Phase::Idle;
            }
        }

        self.prev_flag = state.current_flag;
        self.prev_event_ms = event_ms;
        events
    }

    /// Pre-shutdown drain: finalize now if the session already went
    /// checkered, so the result row is not lost with the worker.
    pub fn finalize_if_checkered(&mut self, state: &SessionState) -> Vec<MonitorEvent> {
        if state.current_flag != Flag::Checkered {
            return Vec::new();
        }
        match self.current.take() {
            Some(session) => {
                self.phase = Phase::Idle;
                info!(%session, "finalizing checkered session on shutdown");
                vec![MonitorEvent::SessionFinalized { session }]
            }
            None => Vec::new(),
        }
    }

    /// Any car advancing past its checkered lap count restarts the settle
    /// window.
    fn note_lap_progress(&mut self, state: &SessionState) {
        let event_ms = parse_clock_ms(&state.local_time_of_day);
        if let Phase::Finishing {
            checkered_laps,
            last_change_event_ms,
        } = &mut self.phase
        {
            for car in &state.car_positions {
                let known = checkered_laps.entry(car.number.clone()).or_insert(0);
                if car.last_lap_completed != *known {
                    *known = car.last_lap_completed;
                    if let Some(ms) = event_ms {
                        *last_change_event_ms = ms;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
