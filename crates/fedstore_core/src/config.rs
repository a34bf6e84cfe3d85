/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Store configuration: an optional JSON file, then `FEDSTORE_*` environment
//! overrides on top.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbDriver {
    #[serde(alias = "sqlite3")]
    Sqlite,
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
}

impl DbDriver {
    pub fn from_str(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub driver: DbDriver,
    pub sqlite_path: PathBuf,
    /// Connection string, required for Postgres.
    pub url: Option<String>,
    pub busy_timeout_ms: u64,
    pub pg_pool_max_size: usize,
    pub pg_pool_wait_ms: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DbDriver::Sqlite,
            sqlite_path: PathBuf::from("fedstore.db"),
            url: None,
            busy_timeout_ms: 5_000,
            pg_pool_max_size: 16,
            pg_pool_wait_ms: Some(5_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: DatabaseConfig,
    /// Items per collection page.
    pub page_size: u32,
    /// Collection nesting allowed when fanning out deliveries.
    pub max_delivery_depth: u32,
    /// Collection nesting allowed when forwarding inbox activities.
    pub max_forwarding_depth: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            page_size: 10,
            max_delivery_depth: 50,
            max_forwarding_depth: 50,
        }
    }
}

impl StoreConfig {
    /// Reads `path` when given, then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    /// Unparsable values are ignored with a warning and the previous value kept.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let db = &mut self.database;
        if let Some(v) = lookup("FEDSTORE_DB_DRIVER") {
            match DbDriver::from_str(&v) {
                Some(driver) => db.driver = driver,
                None => warn!(value = %v, "FEDSTORE_DB_DRIVER not recognized"),
            }
        }
        if let Some(v) = lookup("FEDSTORE_DB_URL") {
            let v = v.trim().to_string();
            db.url = (!v.is_empty()).then_some(v);
        }
        if let Some(v) = lookup("FEDSTORE_DB_PATH") {
            db.sqlite_path = PathBuf::from(v.trim());
        }
        parse_into(&lookup, "FEDSTORE_DB_BUSY_TIMEOUT_MS", &mut db.busy_timeout_ms);
        parse_into(&lookup, "FEDSTORE_PG_POOL_MAX", &mut db.pg_pool_max_size);
        parse_into(&lookup, "FEDSTORE_PAGE_SIZE", &mut self.page_size);
        parse_into(&lookup, "FEDSTORE_MAX_DELIVERY_DEPTH", &mut self.max_delivery_depth);
        parse_into(&lookup, "FEDSTORE_MAX_FORWARDING_DEPTH", &mut self.max_forwarding_depth);
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.driver == DbDriver::Postgres && self.database.url.is_none() {
            anyhow::bail!("postgres driver requires database.url or FEDSTORE_DB_URL");
        }
        if self.page_size == 0 {
            anyhow::bail!("page_size must be positive");
        }
        if self.database.pg_pool_max_size == 0 {
            anyhow::bail!("pg_pool_max_size must be positive");
        }
        Ok(())
    }
}

fn parse_into<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else { return };
    match raw.trim().parse() {
        Ok(v) => *slot = v,
        Err(_) => warn!(key, value = %raw, "ignoring unparsable setting"),
    }
}
