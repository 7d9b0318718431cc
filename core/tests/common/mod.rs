/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#![allow(dead_code)]

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use workbench_core::database::connect_db;
use workbench_core::storage::{LocalContentStore, MemoryContentStore};
use workbench_core::types::*;

pub fn create_test_cli() -> Cli {
    Cli::parse_from([
        "workbench-server",
        "--database-url",
        "sqlite::memory:",
        "--content-store",
        "memory",
        "--log-level",
        "warn",
    ])
}

pub async fn create_test_state() -> (Arc<ServerState>, Arc<MemoryContentStore>) {
    let cli = create_test_cli();
    let db = connect_db(&cli).await.expect("in-memory database");
    let content = Arc::new(MemoryContentStore::default());
    let state = ServerState::new(cli, db, content.clone(), "test-secret".to_string());
    (state, content)
}

/// State backed by a filesystem content store in a fresh temporary directory.
pub async fn create_local_test_state() -> (Arc<ServerState>, PathBuf) {
    let cli = create_test_cli();
    let db = connect_db(&cli).await.expect("in-memory database");
    let root = std::env::temp_dir().join(format!("workbench-test-{}", Uuid::new_v4()));
    let content = LocalContentStore::open(&root).await.expect("local content store");
    let state = ServerState::new(cli, db, Arc::new(content), "test-secret".to_string());
    (state, root)
}
