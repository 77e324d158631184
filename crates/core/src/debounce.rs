// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trailing-edge debouncer for write coalescing.
//!
//! One timer task owns the pending flag; callers poke it through a channel
//! rather than arming per-call timers. The work runs once, Δ after the most
//! recent call.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Handle to a spawned debounce task. Dropping the handle flushes one
/// trailing execution if a call is pending, then stops the task.
pub struct Debouncer {
    tx: mpsc::UnboundedSender<()>,
}

impl Debouncer {
    /// Spawn the timer task. `work` executes on the task, never on the
    /// caller, so `call()` is cheap and non-async.
    pub fn spawn<F, Fut>(delay: Duration, mut work: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        tokio::spawn(async move {
            // Parked far in the future until the first call arrives
            let sleep = tokio::time::sleep(Duration::from_secs(86_400));
            tokio::pin!(sleep);
            let mut pending = false;

            loop {
                tokio::select! {
                    poke = rx.recv() => match poke {
                        Some(()) => {
                            pending = true;
                            sleep.as_mut().reset(Instant::now() + delay);
                        }
                        None => break,
                    },
                    () = &mut sleep, if pending => {
                        pending = false;
                        work().await;
                    }
                }
            }

            if pending {
                work().await;
            }
        });

        Self { tx }
    }

    /// Request one execution Δ from now, coalescing with any pending request.
    pub fn call(&self) {
        let _ = self.tx.send(());
    }
}

#[cfg(test)]
#[path = "debounce_tests.rs"]
mod tests;
