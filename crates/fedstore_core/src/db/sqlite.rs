/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::{DbError, SqlRow, SqlTx, SqlValue};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{ffi, params_from_iter, Connection, ErrorCode, Transaction};
use std::time::Duration;

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == ErrorCode::ConstraintViolation
                    && matches!(
                        code.extended_code,
                        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    ) =>
            {
                DbError::UniqueViolation(msg.clone().unwrap_or_else(|| code.to_string()))
            }
            _ => DbError::Sqlite(e),
        }
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// Text must be valid UTF-8; anything else is reported rather than repaired.
impl TryFrom<ValueRef<'_>> for SqlValue {
    type Error = DbError;

    fn try_from(v: ValueRef<'_>) -> Result<Self, DbError> {
        Ok(match v {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => {
                let text = std::str::from_utf8(t).map_err(rusqlite::Error::Utf8Error)?;
                SqlValue::Text(text.to_owned())
            }
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        })
    }
}

pub(crate) fn apply_pragmas(conn: &Connection, busy_timeout: Duration) -> Result<(), DbError> {
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

fn execute(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let changed = stmt.execute(params_from_iter(params.iter()))?;
    Ok(changed as u64)
}

fn query(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DbError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let cols = stmt.column_count();
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(cols);
        for i in 0..cols {
            values.push(SqlValue::try_from(row.get_ref(i)?)?);
        }
        out.push(SqlRow::new(values));
    }
    Ok(out)
}

fn execute_batch(conn: &Connection, sql: &str) -> Result<(), DbError> {
    conn.execute_batch(sql)?;
    Ok(())
}

impl SqlTx for Transaction<'_> {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        execute(self, sql, params)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), DbError> {
        execute_batch(self, sql)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DbError> {
        query(self, sql, params)
    }
}

/// Autocommit mode: each statement is its own transaction. Handy for tests
/// and one-off maintenance.
impl SqlTx for Connection {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        execute(self, sql, params)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), DbError> {
        execute_batch(self, sql)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DbError> {
        query(self, sql, params)
    }
}
