/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Transaction handles with positional parameter binding.
//!
//! Store operations only ever see `&mut dyn SqlTx`; whoever owns the
//! request-scoped transaction decides when to commit or roll back.

use crate::codec::{CodecError, FromSqlValue};
use crate::config::{DatabaseConfig, DbDriver};
use crate::sql_dialect::SqlDialect;
use crate::{dialect_postgres::PostgresDialect, dialect_sqlite::SqliteDialect};
use deadpool_postgres::{ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::NoTls;
use tracing::{info, warn};

pub mod postgres;
pub mod sqlite;

pub use postgres::block_on_result;

/// A single column value, independent of the engine it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }
}

/// One result row; columns are addressed by position, in the order the
/// dialect documents for the statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow(Vec<SqlValue>);

impl SqlRow {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn value(&self, idx: usize) -> Option<&SqlValue> {
        self.0.get(idx)
    }

    /// Decodes column `idx`.
    pub fn get<T: FromSqlValue>(&self, idx: usize) -> Result<T, CodecError> {
        let v = self.0.get(idx).ok_or(CodecError::MissingColumn(idx))?;
        T::from_sql_value(v)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("sqlite: {0}")]
    Sqlite(rusqlite::Error),
    #[error("postgres: {0}")]
    Postgres(tokio_postgres::Error),
    #[error("postgres pool: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres pool setup: {0}")]
    PoolSetup(#[from] deadpool_postgres::CreatePoolError),
    #[error("database misconfigured: {0}")]
    Config(String),
}

/// An open transaction that executes positional-parameter statements.
pub trait SqlTx {
    /// Runs a statement that returns no rows; yields the affected row count.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError>;

    /// Runs several parameterless statements (schema provisioning).
    fn execute_batch(&mut self, sql: &str) -> Result<(), DbError>;

    /// Runs a statement and collects every row it returns.
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, DbError>;
}

/// Owns connections for one configured engine and hands out scoped
/// transactions.
pub struct Database {
    driver: DbDriver,
    path: PathBuf,
    busy_timeout: Duration,
    pg_pool: Option<Pool>,
    dialect: Arc<dyn SqlDialect>,
}

impl Database {
    pub fn open(cfg: &DatabaseConfig) -> Result<Self, DbError> {
        let (pg_pool, dialect): (Option<Pool>, Arc<dyn SqlDialect>) = match cfg.driver {
            DbDriver::Sqlite => (None, Arc::new(SqliteDialect)),
            DbDriver::Postgres => {
                let url = cfg
                    .url
                    .as_ref()
                    .ok_or_else(|| DbError::Config("database url is required for postgres".into()))?;
                let mut pg = deadpool_postgres::Config::new();
                pg.url = Some(url.clone());
                pg.manager = Some(ManagerConfig {
                    recycling_method: RecyclingMethod::Fast,
                });
                let mut pool_cfg = PoolConfig::new(cfg.pg_pool_max_size);
                pool_cfg.timeouts = Timeouts {
                    wait: cfg.pg_pool_wait_ms.map(Duration::from_millis),
                    create: cfg.pg_pool_wait_ms.map(Duration::from_millis),
                    recycle: None,
                };
                pg.pool = Some(pool_cfg);
                let pool = pg.create_pool(Some(Runtime::Tokio1), NoTls)?;
                (Some(pool), Arc::new(PostgresDialect))
            }
        };
        info!(driver = ?cfg.driver, "database configured");
        Ok(Self {
            driver: cfg.driver,
            path: cfg.sqlite_path.clone(),
            busy_timeout: Duration::from_millis(cfg.busy_timeout_ms),
            pg_pool,
            dialect,
        })
    }

    pub fn driver(&self) -> DbDriver {
        self.driver
    }

    pub fn dialect(&self) -> Arc<dyn SqlDialect> {
        self.dialect.clone()
    }

    fn open_sqlite_conn(&self) -> Result<Connection, DbError> {
        let conn = Connection::open(&self.path).map_err(DbError::from)?;
        sqlite::apply_pragmas(&conn, self.busy_timeout)?;
        Ok(conn)
    }

    fn pg_pool(&self) -> Result<&Pool, DbError> {
        self.pg_pool
            .as_ref()
            .ok_or_else(|| DbError::Config("postgres pool not initialized".into()))
    }

    /// Runs `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    /// A panic inside `f` drops the transaction, which also rolls back.
    pub fn transact<T, E>(&self, f: impl FnOnce(&mut dyn SqlTx) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        match self.driver {
            DbDriver::Sqlite => {
                let mut conn = self.open_sqlite_conn()?;
                let mut tx = conn.transaction().map_err(DbError::from)?;
                match f(&mut tx) {
                    Ok(v) => {
                        tx.commit().map_err(DbError::from)?;
                        Ok(v)
                    }
                    Err(e) => {
                        if let Err(rb) = tx.rollback() {
                            warn!("sqlite rollback failed: {rb}");
                        }
                        Err(e)
                    }
                }
            }
            DbDriver::Postgres => {
                let mut client = block_on_result(self.pg_pool()?.get())?;
                let mut tx = block_on_result(client.transaction())?;
                match f(&mut tx) {
                    Ok(v) => {
                        block_on_result(tx.commit())?;
                        Ok(v)
                    }
                    Err(e) => {
                        if let Err(rb) = block_on_result(tx.rollback()) {
                            warn!("postgres rollback failed: {rb}");
                        }
                        Err(e)
                    }
                }
            }
        }
    }

    pub fn health_check(&self) -> Result<(), DbError> {
        self.transact(|tx| {
            let rows = tx.query("SELECT 1", &[])?;
            if rows.len() == 1 {
                Ok(())
            } else {
                Err(DbError::Config("health check returned no row".into()))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::{provision_schema, Models};
    use fedstore_vocab::ActivityStreams;
    use serde_json::json;
    use url::Url;

    fn open(dir: &tempfile::TempDir) -> Database {
        let cfg = DatabaseConfig {
            sqlite_path: dir.path().join("store.db"),
            ..DatabaseConfig::default()
        };
        let db = Database::open(&cfg).unwrap();
        let dialect = db.dialect();
        db.transact(|tx| provision_schema(tx, &*dialect)).unwrap();
        db
    }

    fn note(id: &str) -> ActivityStreams {
        ActivityStreams::from_value(json!({"type": "Note", "id": id})).unwrap()
    }

    #[test]
    fn transact_commits_on_ok_and_rolls_back_on_err() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        let models = Models::new(db.dialect());
        let kept = Url::parse("https://a.example/notes/kept").unwrap();
        let dropped = Url::parse("https://a.example/notes/dropped").unwrap();

        db.transact(|tx| models.local_data.create(tx, &note(kept.as_str())))
            .unwrap();
        let failed: Result<(), StoreError> = db.transact(|tx| {
            models.local_data.create(tx, &note(dropped.as_str()))?;
            Err(StoreError::NotFound("forced".into()))
        });
        assert!(failed.is_err());

        db.transact(|tx| {
            assert!(models.local_data.find(tx, &kept)?.is_some());
            assert!(models.local_data.find(tx, &dropped)?.is_none());
            Ok::<_, StoreError>(())
        })
        .unwrap();
    }

    #[test]
    fn file_database_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        assert_eq!(db.driver(), DbDriver::Sqlite);
        db.health_check().unwrap();
    }

    #[test]
    fn postgres_without_url_is_a_config_error() {
        let cfg = DatabaseConfig {
            driver: DbDriver::Postgres,
            ..DatabaseConfig::default()
        };
        assert!(matches!(Database::open(&cfg), Err(DbError::Config(_))));
    }

    fn unreachable_postgres() -> Database {
        let cfg = DatabaseConfig {
            driver: DbDriver::Postgres,
            url: Some("postgres://fedstore@127.0.0.1:1/fedstore".into()),
            pg_pool_wait_ms: Some(200),
            ..DatabaseConfig::default()
        };
        Database::open(&cfg).unwrap()
    }

    #[test]
    fn postgres_outside_a_runtime_is_a_config_error() {
        let db = unreachable_postgres();
        assert!(matches!(db.health_check(), Err(DbError::Config(_))));
        assert!(matches!(
            block_on_result(async { Ok::<_, DbError>(1) }),
            Err(DbError::Config(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn postgres_on_a_current_thread_runtime_is_a_config_error() {
        let db = unreachable_postgres();
        assert!(matches!(db.health_check(), Err(DbError::Config(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn multi_thread_runtime_drives_blocking_calls() {
        assert_eq!(block_on_result(async { Ok::<_, DbError>(7) }).unwrap(), 7);
    }

    #[test]
    fn missing_column_is_reported() {
        let row = SqlRow::new(vec![SqlValue::Integer(1)]);
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
        assert!(matches!(row.get::<i64>(3), Err(CodecError::MissingColumn(3))));
    }
}
