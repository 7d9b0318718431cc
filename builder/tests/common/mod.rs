/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#![allow(dead_code)]

use builder::coordinator::{BuildCoordinator, BuildReport};
use clap::Parser;
use entity::file::FileType;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use workbench_core::database::connect_db;
use workbench_core::project::NewFile;
use workbench_core::storage::MemoryContentStore;
use workbench_core::types::*;

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

pub async fn create_test_state() -> (Arc<ServerState>, Arc<MemoryContentStore>) {
    let cli = create_test_cli();
    let db = connect_db(&cli).await.expect("in-memory database");
    let content = Arc::new(MemoryContentStore::default());
    let state = ServerState::new(cli, db, content.clone(), "test-secret".to_string());
    (state, content)
}

/// Creates a project owned by [`OWNER`] holding the given files. Parent
/// directories are created as needed.
pub async fn create_project(state: &ServerState, files: &[(&str, &str)]) -> MProject {
    let project = state
        .projects
        .create_project("demo", None, OWNER)
        .await
        .expect("project");

    for (path, content) in files {
        let mut parent = None::<String>;
        for segment in path.split('/').take(path.split('/').count() - 1) {
            let dir = match &parent {
                Some(parent) => format!("{}/{}", parent, segment),
                None => segment.to_string(),
            };

            if state.projects.get_file(project.id, &dir).await.is_err() {
                state
                    .projects
                    .create_file(
                        project.id,
                        NewFile {
                            path: dir.clone(),
                            name: segment.to_string(),
                            file_type: FileType::Directory,
                            parent_path: None,
                            content: None,
                        },
                    )
                    .await
                    .expect("directory");
            }

            parent = Some(dir);
        }

        state
            .projects
            .create_file(
                project.id,
                NewFile {
                    path: path.to_string(),
                    name: path.rsplit('/').next().unwrap_or(path).to_string(),
                    file_type: FileType::File,
                    parent_path: None,
                    content: Some(content.to_string()),
                },
            )
            .await
            .expect("file");
    }

    project
}

pub async fn wait_for_terminal(coordinator: &BuildCoordinator, build_id: Uuid) -> BuildReport {
    for _ in 0..500 {
        let report = coordinator.get_status(build_id).await.expect("build");
        if report.build.status.is_terminal() {
            return report;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("build {} did not finish", build_id);
}
