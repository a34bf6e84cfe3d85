/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Store operations. Each model holds the shared dialect and takes the
//! caller's transaction on every call; none of them commits.

use crate::db::{SqlRow, SqlTx};
use crate::error::{Result, StoreError};
use crate::sql_dialect::SqlDialect;
use std::sync::Arc;
use tracing::{error, info};

pub mod collections;
pub mod delivery_attempts;
pub mod oauth;
pub mod object_data;
pub mod private_keys;
pub mod users;

#[cfg(test)]
mod conformance;

pub use collections::{link_page, Inboxes, OrderedCollections, Outboxes};
pub use delivery_attempts::{AttemptId, AttemptStats, DeliveryAttempts, FailedAttempt};
pub use oauth::{ClientInfo, ClientInfos, TokenInfo, TokenInfos};
pub use object_data::{FedData, LocalData, ObjectData};
pub use private_keys::PrivateKeys;
pub use users::{NewUser, Preferences, Privileges, SensitiveUser, User, Users};

/// Lookups that must match a single row. Zero rows is `NotFound`; more than
/// one means the schema lost a uniqueness guarantee and is reported, not
/// papered over by taking the first.
pub(crate) fn exactly_one(rows: Vec<SqlRow>, what: &str) -> Result<SqlRow> {
    at_most_one(rows, what)?.ok_or_else(|| StoreError::NotFound(what.to_string()))
}

pub(crate) fn at_most_one(mut rows: Vec<SqlRow>, what: &str) -> Result<Option<SqlRow>> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => {
            error!(what, rows = n, "lookup matched more than one row");
            Err(StoreError::AmbiguousResult {
                what: what.to_string(),
                rows: n,
            })
        }
    }
}

/// Creates every table the store uses. Safe to run on an existing schema.
pub fn provision_schema(tx: &mut dyn SqlTx, dialect: &dyn SqlDialect) -> Result<()> {
    let stmts = dialect.schema();
    for ddl in &stmts {
        tx.execute_batch(ddl)?;
    }
    info!(dialect = dialect.name(), tables = stmts.len(), "schema provisioned");
    Ok(())
}

/// One handle per model, all sharing a dialect.
#[derive(Clone)]
pub struct Models {
    pub inboxes: Inboxes,
    pub outboxes: Outboxes,
    pub users: Users,
    pub fed_data: FedData,
    pub local_data: LocalData,
    pub delivery_attempts: DeliveryAttempts,
    pub private_keys: PrivateKeys,
    pub client_infos: ClientInfos,
    pub token_infos: TokenInfos,
}

impl Models {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self {
            inboxes: Inboxes::new(dialect.clone()),
            outboxes: Outboxes::new(dialect.clone()),
            users: Users::new(dialect.clone()),
            fed_data: FedData::new(dialect.clone()),
            local_data: LocalData::new(dialect.clone()),
            delivery_attempts: DeliveryAttempts::new(dialect.clone()),
            private_keys: PrivateKeys::new(dialect.clone()),
            client_infos: ClientInfos::new(dialect.clone()),
            token_infos: TokenInfos::new(dialect),
        }
    }
}
