/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! One-time schema provisioning: `fedstore_bootstrap [--config path.json]`.

use anyhow::{Context, Result};
use fedstore_core::{provision_schema, Database, StoreConfig};
use std::path::PathBuf;
use tracing::info;

fn parse_config_path() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return Ok(Some(PathBuf::from(path)));
            }
            return Err(anyhow::anyhow!("--config requires a path"));
        }
    }
    Ok(std::env::var("FEDSTORE_CONFIG").ok().map(PathBuf::from))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().context("log directive")?),
        )
        .init();

    let cfg_path = parse_config_path()?;
    if let Some(path) = &cfg_path {
        info!("config: {}", path.display());
    }
    let cfg = StoreConfig::load(cfg_path.as_deref())?;
    let db = Database::open(&cfg.database).context("open database")?;
    let dialect = db.dialect();
    db.transact(|tx| provision_schema(tx, &*dialect))
        .context("provision schema")?;
    db.health_check().context("health check")?;
    info!(driver = ?db.driver(), dialect = dialect.name(), "schema ready");
    Ok(())
}
