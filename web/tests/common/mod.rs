/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#![allow(dead_code)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use builder::start_builder;
use clap::Parser;
use std::sync::Arc;
use workbench_core::database::connect_db;
use workbench_core::storage::MemoryContentStore;
use workbench_core::types::*;
use web::auth::encode_jwt;
use web::create_router;

pub const SECRET: &str = "test-secret";
pub const OWNER: &str = "owner-1";

pub fn create_test_cli() -> Cli {
    Cli::parse_from([
        "workbench-server",
        "--database-url",
        "sqlite::memory:",
        "--content-store",
        "memory",
        "--log-level",
        "warn",
        "--log-poll-interval-ms",
        "10",
    ])
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<ServerState>,
    pub content: Arc<MemoryContentStore>,
}

pub async fn create_test_app() -> TestApp {
    let cli = create_test_cli();
    let db = connect_db(&cli).await.expect("in-memory database");
    let content = Arc::new(MemoryContentStore::default());
    let state = ServerState::new(cli, db, content.clone(), SECRET.to_string());
    let builds = start_builder(Arc::clone(&state));

    let server = TestServer::new(create_router(Arc::clone(&state), builds)).expect("test server");

    TestApp {
        server,
        state,
        content,
    }
}

pub fn bearer(owner: &str) -> HeaderValue {
    let token = encode_jwt(SECRET, owner).expect("token");
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("header value")
}
