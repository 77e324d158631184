// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handle to the authoritative session state.
//!
//! The pipeline is the only writer. The snapshot timer and the admin
//! `/state` endpoint take read locks; serialization always happens under a
//! read lock, never the write lock, and no lock is held across I/O.

use parking_lot::RwLock;
use pw_core::{EventId, SessionId, SessionState};
use std::sync::Arc;

#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<RwLock<SessionState>>,
}

impl StateHandle {
    pub fn new(event: EventId, session: SessionId) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState::new(event, session))),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Full clone for snapshot serialization.
    pub fn snapshot(&self) -> SessionState {
        self.inner.read().clone()
    }

    /// Atomically swap in a fresh state (session change), returning the
    /// prior instance for final-result persistence.
    pub fn replace(&self, next: SessionState) -> SessionState {
        std::mem::replace(&mut self.inner.write(), next)
    }
}
