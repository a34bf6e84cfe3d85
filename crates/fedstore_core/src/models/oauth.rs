/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! OAuth2 client registrations and issued tokens. Only storage lives here;
//! the authorization flows that produce these records are elsewhere.

use super::exactly_one;
use crate::codec::NullDuration;
use crate::db::{SqlRow, SqlTx};
use crate::error::Result;
use crate::sql_dialect::SqlDialect;
use crate::sql_params;
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: String,
    pub secret: String,
    pub domain: String,
    pub user_id: String,
}

#[derive(Clone)]
pub struct ClientInfos {
    dialect: Arc<dyn SqlDialect>,
}

impl ClientInfos {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self { dialect }
    }

    /// Returns the generated client id.
    pub fn create(&self, tx: &mut dyn SqlTx, secret: &str, domain: &str, user_id: &str) -> Result<String> {
        let rows = tx.query(
            self.dialect.create_client_info(),
            &sql_params![secret, domain, user_id],
        )?;
        Ok(exactly_one(rows, "inserted client")?.get(0)?)
    }

    pub fn get_by_id(&self, tx: &mut dyn SqlTx, id: &str) -> Result<ClientInfo> {
        let rows = tx.query(self.dialect.get_client_info_by_id(), &sql_params![id])?;
        let row = exactly_one(rows, &format!("client {id}"))?;
        Ok(ClientInfo {
            id: row.get(0)?,
            secret: row.get(1)?,
            domain: row.get(2)?,
            user_id: row.get(3)?,
        })
    }
}

/// One issued grant. Each of code, access and refresh is optional and
/// carries its own creation time and lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub client_id: String,
    pub user_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub code: Option<String>,
    pub code_created: Option<OffsetDateTime>,
    pub code_expires_in: NullDuration,
    pub access: Option<String>,
    pub access_created: Option<OffsetDateTime>,
    pub access_expires_in: NullDuration,
    pub refresh: Option<String>,
    pub refresh_created: Option<OffsetDateTime>,
    pub refresh_expires_in: NullDuration,
}

fn expired(created: Option<OffsetDateTime>, lifetime: NullDuration, now: OffsetDateTime) -> bool {
    match (created, lifetime.0) {
        (Some(c), Some(d)) => c + d <= now,
        _ => false,
    }
}

impl TokenInfo {
    /// A token without a lifetime never expires.
    pub fn access_expired(&self, now: OffsetDateTime) -> bool {
        expired(self.access_created, self.access_expires_in, now)
    }

    pub fn code_expired(&self, now: OffsetDateTime) -> bool {
        expired(self.code_created, self.code_expires_in, now)
    }

    pub fn refresh_expired(&self, now: OffsetDateTime) -> bool {
        expired(self.refresh_created, self.refresh_expires_in, now)
    }

    fn from_row(row: &SqlRow) -> Result<Self> {
        Ok(Self {
            client_id: row.get(0)?,
            user_id: row.get(1)?,
            redirect_uri: row.get(2)?,
            scope: row.get(3)?,
            code: row.get(4)?,
            code_created: row.get(5)?,
            code_expires_in: row.get(6)?,
            access: row.get(7)?,
            access_created: row.get(8)?,
            access_expires_in: row.get(9)?,
            refresh: row.get(10)?,
            refresh_created: row.get(11)?,
            refresh_expires_in: row.get(12)?,
        })
    }
}

#[derive(Clone)]
pub struct TokenInfos {
    dialect: Arc<dyn SqlDialect>,
}

impl TokenInfos {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Self { dialect }
    }

    pub fn create(&self, tx: &mut dyn SqlTx, t: &TokenInfo) -> Result<()> {
        let params = sql_params![
            t.client_id,
            t.user_id,
            t.redirect_uri,
            t.scope,
            t.code,
            t.code_created,
            t.code_expires_in,
            t.access,
            t.access_created,
            t.access_expires_in,
            t.refresh,
            t.refresh_created,
            t.refresh_expires_in,
        ];
        tx.execute(self.dialect.create_token_info(), &params)?;
        Ok(())
    }

    pub fn remove_by_code(&self, tx: &mut dyn SqlTx, code: &str) -> Result<()> {
        tx.execute(self.dialect.remove_token_info_by_code(), &sql_params![code])?;
        Ok(())
    }

    pub fn remove_by_access(&self, tx: &mut dyn SqlTx, access: &str) -> Result<()> {
        tx.execute(self.dialect.remove_token_info_by_access(), &sql_params![access])?;
        Ok(())
    }

    pub fn remove_by_refresh(&self, tx: &mut dyn SqlTx, refresh: &str) -> Result<()> {
        tx.execute(self.dialect.remove_token_info_by_refresh(), &sql_params![refresh])?;
        Ok(())
    }

    pub fn get_by_code(&self, tx: &mut dyn SqlTx, code: &str) -> Result<TokenInfo> {
        let rows = tx.query(self.dialect.get_token_info_by_code(), &sql_params![code])?;
        TokenInfo::from_row(&exactly_one(rows, "token by code")?)
    }

    pub fn get_by_access(&self, tx: &mut dyn SqlTx, access: &str) -> Result<TokenInfo> {
        let rows = tx.query(self.dialect.get_token_info_by_access(), &sql_params![access])?;
        TokenInfo::from_row(&exactly_one(rows, "token by access")?)
    }

    pub fn get_by_refresh(&self, tx: &mut dyn SqlTx, refresh: &str) -> Result<TokenInfo> {
        let rows = tx.query(self.dialect.get_token_info_by_refresh(), &sql_params![refresh])?;
        TokenInfo::from_row(&exactly_one(rows, "token by refresh")?)
    }
}
