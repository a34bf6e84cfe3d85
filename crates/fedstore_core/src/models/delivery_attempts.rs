/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Outbound delivery attempts.
//!
//! An attempt is written once as pending and then settled exactly once as
//! succeeded or failed. Settling is a conditional update on the pending
//! state, so two workers racing on the same attempt cannot both win. A retry
//! is a new attempt; a failed attempt never returns to pending.

use super::{at_most_one, exactly_one};
use crate::codec::DeliveryState;
use crate::db::SqlTx;
use crate::error::{Result, StoreError};
use crate::sql_dialect::SqlDialect;
use crate::sql_params;
use fedstore_vocab::ActivityStreams;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub i64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptStats {
    pub pending: u64,
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedAttempt {
    pub id: AttemptId,
    pub to: Url,
    pub payload: ActivityStreams,
}

#[derive(Clone)]
pub struct DeliveryAttempts {
    dialect: Arc<dyn SqlDialect>,
}

impl DeliveryAttempts {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self { dialect }
    }

    /// Records a pending delivery of `payload` from `from` to `to`.
    pub fn insert_attempt(
        &self,
        tx: &mut dyn SqlTx,
        from: &Url,
        to: &Url,
        payload: &ActivityStreams,
    ) -> Result<AttemptId> {
        let params = sql_params![from, to, payload, DeliveryState::Pending];
        let rows = tx.query(self.dialect.insert_attempt(), &params)?;
        let id = AttemptId(exactly_one(rows, "inserted delivery attempt")?.get(0)?);
        debug!(attempt = %id, from = %from, to = %to, "delivery attempt recorded");
        Ok(id)
    }

    pub fn mark_succeeded(&self, tx: &mut dyn SqlTx, id: AttemptId) -> Result<()> {
        self.settle(tx, id, self.dialect.mark_successful_attempt(), DeliveryState::Succeeded)
    }

    pub fn mark_failed(&self, tx: &mut dyn SqlTx, id: AttemptId) -> Result<()> {
        self.settle(tx, id, self.dialect.mark_failed_attempt(), DeliveryState::Failed)
    }

    fn settle(&self, tx: &mut dyn SqlTx, id: AttemptId, sql: &str, to: DeliveryState) -> Result<()> {
        let changed = tx.execute(sql, &sql_params![id.0])?;
        if changed == 1 {
            debug!(attempt = %id, state = %to, "delivery attempt settled");
            return Ok(());
        }
        let rows = tx.query(self.dialect.attempt_state(), &sql_params![id.0])?;
        match at_most_one(rows, "delivery attempt")? {
            None => Err(StoreError::NotFound(format!("delivery attempt {id}"))),
            Some(row) => {
                let state: DeliveryState = row.get(0)?;
                warn!(attempt = %id, current = %state, requested = %to, "rejected delivery state change");
                Err(StoreError::InvalidTransition { id: id.0, state })
            }
        }
    }

    pub fn state(&self, tx: &mut dyn SqlTx, id: AttemptId) -> Result<DeliveryState> {
        let rows = tx.query(self.dialect.attempt_state(), &sql_params![id.0])?;
        Ok(exactly_one(rows, &format!("delivery attempt {id}"))?.get(0)?)
    }

    pub fn stats(&self, tx: &mut dyn SqlTx) -> Result<AttemptStats> {
        let rows = tx.query(self.dialect.count_attempts_by_state(), &[])?;
        let mut stats = AttemptStats::default();
        for row in rows {
            let state: DeliveryState = row.get(0)?;
            let count: u64 = row.get(1)?;
            match state {
                DeliveryState::Pending => stats.pending = count,
                DeliveryState::Succeeded => stats.succeeded = count,
                DeliveryState::Failed => stats.failed = count,
            }
        }
        Ok(stats)
    }

    /// Failed attempts sent by `from`, oldest first, for scheduling retries.
    pub fn failed_from(&self, tx: &mut dyn SqlTx, from: &Url, limit: u32) -> Result<Vec<FailedAttempt>> {
        let rows = tx.query(
            self.dialect.failed_attempts_from(),
            &sql_params![from, i64::from(limit)],
        )?;
        rows.iter()
            .map(|row| {
                Ok(FailedAttempt {
                    id: AttemptId(row.get(0)?),
                    to: row.get(1)?,
                    payload: row.get(2)?,
                })
            })
            .collect()
    }
}
