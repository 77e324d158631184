// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-storage: Postgres repositories for the rows the core touches.
//!
//! Queries are runtime-bound (no compile-time schema checks) and grouped
//! per concern. Retry policy lives with the callers; this crate reports
//! errors and keeps transactions small.

pub mod events;
pub mod frame_logs;
pub mod laps;
pub mod orgs;
pub mod purge;
pub mod relay_logs;
pub mod sessions;

pub use events::EventRow;
pub use frame_logs::RelayFrameLogRow;
pub use sqlx::types::Json;
pub use laps::{CarLapLogRow, FlagLogRow};
pub use orgs::OrganizationRow;
pub use purge::X2PassingRow;
pub use relay_logs::RelayLogRow;
pub use sessions::{SessionResultRow, SessionRow};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared database handle; clones share the pool.
#[derive(Clone)]
pub struct Db {
    pub(crate) pool: PgPool,
}

impl Db {
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Liveness probe for health endpoints.
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
