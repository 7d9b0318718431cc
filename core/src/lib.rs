/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod consts;
pub mod database;
pub mod error;
pub mod input;
pub mod locks;
pub mod project;
pub mod storage;
pub mod types;

use anyhow::{Context, Result};
use database::connect_db;
use input::load_secret;
use std::path::Path;
use std::sync::Arc;
use storage::{ContentStore, LocalContentStore, MemoryContentStore};
use tracing::info;
use tracing_subscriber::EnvFilter;
use types::*;

pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn init_state(cli: Cli) -> Result<Arc<ServerState>> {
    info!("Starting Workbench Server on {}:{}", cli.ip, cli.port);

    let jwt_secret = match &cli.jwt_secret_file {
        Some(file) => load_secret(file),
        None => anyhow::bail!("No JWT secret file provided"),
    };

    if jwt_secret.is_empty() {
        anyhow::bail!("JWT secret file is empty or unreadable");
    }

    let db = connect_db(&cli).await?;

    let content: Arc<dyn ContentStore> = match cli.content_store {
        ContentStoreKind::Local => {
            let root = Path::new(&cli.base_path).join("content");
            Arc::new(
                LocalContentStore::open(root)
                    .await
                    .context("Failed to open content store")?,
            )
        }
        ContentStoreKind::Memory => Arc::new(MemoryContentStore::default()),
    };

    Ok(ServerState::new(cli, db, content, jwt_secret))
}
