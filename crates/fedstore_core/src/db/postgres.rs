/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::{DbError, SqlRow, SqlTx, SqlValue};
use bytes::{BufMut, BytesMut};
use std::error::Error as StdError;
use std::future::Future;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, ToSql, Type};
use tokio_postgres::Transaction;

type BoxError = Box<dyn StdError + Sync + Send>;

const JSONB_VERSION: u8 = 1;

impl From<tokio_postgres::Error> for DbError {
    fn from(e: tokio_postgres::Error) -> Self {
        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            let detail = e
                .as_db_error()
                .map(|d| d.message().to_string())
                .unwrap_or_else(|| e.to_string());
            return DbError::UniqueViolation(detail);
        }
        DbError::Postgres(e)
    }
}

/// Drives a postgres future to completion from synchronous store code.
///
/// The pool's connection tasks live on the caller's runtime, so this needs a
/// multi-thread tokio runtime to park on. Anything else is a `Config` error.
pub fn block_on_result<F, T, E>(fut: F) -> Result<T, DbError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DbError>,
{
    let handle = runtime_handle()?;
    tokio::task::block_in_place(|| handle.block_on(fut)).map_err(Into::into)
}

fn runtime_handle() -> Result<Handle, DbError> {
    let handle = Handle::try_current().map_err(|_| {
        DbError::Config("postgres access needs a multi-thread tokio runtime, none is running".into())
    })?;
    match handle.runtime_flavor() {
        RuntimeFlavor::CurrentThread => Err(DbError::Config(
            "postgres access needs a multi-thread tokio runtime, found current_thread".into(),
        )),
        _ => Ok(handle),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(b) => b.to_sql(ty, out),
            SqlValue::Integer(i) => {
                if *ty == Type::INT2 {
                    i16::try_from(*i)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*i)?.to_sql(ty, out)
                } else if *ty == Type::BOOL {
                    (*i != 0).to_sql(ty, out)
                } else {
                    i.to_sql(ty, out)
                }
            }
            SqlValue::Real(f) => {
                if *ty == Type::FLOAT4 {
                    (*f as f32).to_sql(ty, out)
                } else {
                    f.to_sql(ty, out)
                }
            }
            SqlValue::Text(s) => write_bytes(s.as_bytes(), ty, out),
            SqlValue::Blob(b) => write_bytes(b, ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Text, bytea and json columns all take the raw bytes; jsonb wants its
/// version prefix first.
fn write_bytes(b: &[u8], ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::JSONB {
        out.put_u8(JSONB_VERSION);
    }
    out.put_slice(b);
    Ok(IsNull::No)
}

impl<'a> FromSql<'a> for SqlValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let v = if *ty == Type::BOOL {
            SqlValue::Bool(bool::from_sql(ty, raw)?)
        } else if *ty == Type::INT2 {
            SqlValue::Integer(i16::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT4 {
            SqlValue::Integer(i32::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT8 {
            SqlValue::Integer(i64::from_sql(ty, raw)?)
        } else if *ty == Type::FLOAT4 {
            SqlValue::Real(f32::from_sql(ty, raw)?.into())
        } else if *ty == Type::FLOAT8 {
            SqlValue::Real(f64::from_sql(ty, raw)?)
        } else if *ty == Type::BYTEA {
            SqlValue::Blob(raw.to_vec())
        } else if *ty == Type::JSON {
            SqlValue::Blob(raw.to_vec())
        } else if *ty == Type::JSONB {
            match raw.split_first() {
                Some((&JSONB_VERSION, rest)) => SqlValue::Blob(rest.to_vec()),
                _ => return Err("unsupported jsonb encoding version".into()),
            }
        } else if <String as FromSql>::accepts(ty) {
            SqlValue::Text(String::from_sql(ty, raw)?)
        } else {
            return Err(format!("unsupported column type {ty}").into());
        };
        Ok(v)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(SqlValue::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn bind(params: &[SqlValue]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

fn execute(tx: &Transaction<'_>, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
    block_on_result(tx.execute(sql, &bind(params)))
}

fn execute_batch(tx: &Transaction<'_>, sql: &str) -> Result<(), DbError> {
    block_on_result(tx.batch_execute(sql))
}

fn query(tx: &Transaction<'_>, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DbError> {
    let rows = block_on_result(tx.query(sql, &bind(params)))?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(row.len());
        for i in 0..row.len() {
            values.push(row.try_get::<_, SqlValue>(i)?);
        }
        out.push(SqlRow::new(values));
    }
    Ok(out)
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

impl SqlTx for deadpool_postgres::Transaction<'_> {
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
