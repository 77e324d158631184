// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-archive: daily archival of completed events.
//!
//! Once a day, at midnight in a fixed zone, completed events move to
//! object storage (logs, laps, device data, flags, competitor metadata in
//! a stable layout) and their hot relational rows are purged. The purge
//! runs only after the archive landed and the flag flipped. Failures are
//! per-event: one bad event mails a report and the rest continue.

pub mod archiver;
pub mod mailer;
pub mod ports;
pub mod scheduler;
pub mod store;

pub use archiver::Archiver;
pub use mailer::{FailureMailer, LogMailer, WebhookMailer};
pub use ports::ArchiveDb;
pub use scheduler::next_midnight;
pub use store::{FsObjectStore, ObjectStore, StoreError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("storage error: {0}")]
    Storage(#[from] pw_storage::StorageError),

    #[error("object store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("unknown archive time zone: {0}")]
    UnknownTimeZone(String),
}
