// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Organizations` rows.

use crate::{Db, StorageError};
use pw_core::OrgId;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct OrganizationRow {
    pub id: i64,
    pub short_name: String,
    /// Which external control-log source the org uses, if any; present
    /// means a control-log worker runs for the org's live events.
    pub control_log_type: Option<String>,
}

impl Db {
    pub async fn organization(&self, org: OrgId) -> Result<Option<OrganizationRow>, StorageError> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, short_name, control_log_type FROM organizations WHERE id = $1",
        )
        .bind(org.value())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
