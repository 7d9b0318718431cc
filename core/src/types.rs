/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::input::{greater_than_zero, port_in_range};
use super::project::ProjectActor;
use super::storage::ContentStore;
use clap::{Parser, ValueEnum};
use entity::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentStoreKind {
    Local,
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "Workbench", display_name = "Workbench", bin_name = "workbench-server", version, about, long_about = None)]
pub struct Cli {
    #[arg(long, env = "WORKBENCH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
    #[arg(long, env = "WORKBENCH_IP", default_value = "127.0.0.1")]
    pub ip: String,
    #[arg(long, env = "WORKBENCH_PORT", value_parser = port_in_range, default_value_t = 3000)]
    pub port: u16,
    #[arg(long, env = "WORKBENCH_DATABASE_URL")]
    pub database_url: Option<String>,
    #[arg(long, env = "WORKBENCH_DATABASE_URL_FILE")]
    pub database_url_file: Option<String>,
    #[arg(long, env = "WORKBENCH_CONTENT_STORE", value_enum, default_value = "local")]
    pub content_store: ContentStoreKind,
    #[arg(long, env = "WORKBENCH_BASE_PATH", default_value = ".")]
    pub base_path: String,
    #[arg(long, env = "WORKBENCH_MAX_CONCURRENT_BUILDS", value_parser = greater_than_zero::<usize>, default_value = "16")]
    pub max_concurrent_builds: usize,
    #[arg(long, env = "WORKBENCH_LOG_POLL_INTERVAL_MS", value_parser = greater_than_zero::<u64>, default_value = "250")]
    pub log_poll_interval_ms: u64,
    #[arg(long, env = "WORKBENCH_JWT_SECRET_FILE")]
    pub jwt_secret_file: Option<String>,
    #[arg(long, env = "WORKBENCH_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

#[derive(Debug)]
pub struct ServerState {
    pub db: Arc<DatabaseConnection>,
    pub cli: Cli,
    pub content: Arc<dyn ContentStore>,
    pub projects: ProjectActor,
    pub jwt_secret: String,
}

impl ServerState {
    pub fn new(
        cli: Cli,
        db: DatabaseConnection,
        content: Arc<dyn ContentStore>,
        jwt_secret: String,
    ) -> Arc<Self> {
        let db = Arc::new(db);
        let projects = ProjectActor::new(Arc::clone(&db), Arc::clone(&content));

        Arc::new(ServerState {
            db,
            cli,
            content,
            projects,
            jwt_secret,
        })
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BaseResponse<T> {
    pub error: bool,
    pub message: T,
}

pub type EBuild = build::Entity;
pub type EBuildLog = build_log::Entity;
pub type EFile = file::Entity;
pub type EProject = project::Entity;

pub type MBuild = build::Model;
pub type MBuildLog = build_log::Model;
pub type MFile = file::Model;
pub type MProject = project::Model;

pub type ABuild = build::ActiveModel;
pub type ABuildLog = build_log::ActiveModel;
pub type AFile = file::ActiveModel;
pub type AProject = project::ActiveModel;

pub type CBuild = build::Column;
pub type CBuildLog = build_log::Column;
pub type CFile = file::Column;
pub type CProject = project::Column;
