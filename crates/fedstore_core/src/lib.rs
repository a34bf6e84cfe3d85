/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Relational storage for federated actors: prepend-ordered inbox and outbox
//! collections, stored ActivityStreams documents, and the outbound delivery
//! attempt queue, portable across SQLite and PostgreSQL.

pub mod codec;
pub mod config;
pub mod db;
pub mod delivery;
pub mod dialect_postgres;
pub mod dialect_sqlite;
pub mod error;
pub mod models;
pub mod paths;
pub mod sql_dialect;

pub use config::{DatabaseConfig, DbDriver, StoreConfig};
pub use db::{Database, DbError, SqlRow, SqlTx, SqlValue};
pub use error::{Result, StoreError};
pub use models::{provision_schema, Models};
pub use sql_dialect::SqlDialect;
