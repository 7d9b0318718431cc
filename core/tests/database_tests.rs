/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

mod common;

use entity::build::BuildStatus;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;
use workbench_core::consts::RESTART_ERROR;
use workbench_core::database::update_db;
use workbench_core::project::now;
use workbench_core::types::*;

async fn insert_build(state: &ServerState, project: Uuid, status: BuildStatus) -> MBuild {
    ABuild {
        id: Set(Uuid::new_v4()),
        project: Set(project),
        status: Set(status),
        preview_url: Set(None),
        error: Set(None),
        started_at: Set(now()),
        completed_at: Set(None),
    }
    .insert(&*state.db)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_update_db_fails_interrupted_builds() {
    let (state, _) = common::create_test_state().await;
    let project = state
        .projects
        .create_project("demo", None, "owner-1")
        .await
        .unwrap();

    let installing = insert_build(&state, project.id, BuildStatus::Installing).await;
    let pending = insert_build(&state, project.id, BuildStatus::Pending).await;
    let finished = insert_build(&state, project.id, BuildStatus::Success).await;

    ABuildLog {
        id: Set(Uuid::new_v4()),
        build: Set(installing.id),
        position: Set(0),
        message: Set("Fetched 1 files".to_string()),
        created_at: Set(now()),
    }
    .insert(&*state.db)
    .await
    .unwrap();

    update_db(&*state.db).await.unwrap();

    for id in [installing.id, pending.id] {
        let build = EBuild::find_by_id(id)
            .one(&*state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(build.status, BuildStatus::Failed);
        assert_eq!(build.error.as_deref(), Some(RESTART_ERROR));
        assert!(build.completed_at.is_some());
    }

    let logs = EBuildLog::find()
        .filter(CBuildLog::Build.eq(installing.id))
        .order_by_asc(CBuildLog::Position)
        .all(&*state.db)
        .await
        .unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1].position, 1);
    assert!(logs[1].message.contains(RESTART_ERROR));

    let untouched = EBuild::find_by_id(finished.id)
        .one(&*state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.status, BuildStatus::Success);
    assert_eq!(untouched.error, None);
}

#[tokio::test]
async fn test_update_db_is_idempotent() {
    let (state, _) = common::create_test_state().await;
    let project = state
        .projects
        .create_project("demo", None, "owner-1")
        .await
        .unwrap();
    let build = insert_build(&state, project.id, BuildStatus::Building).await;

    update_db(&*state.db).await.unwrap();
    update_db(&*state.db).await.unwrap();

    let logs = EBuildLog::find()
        .filter(CBuildLog::Build.eq(build.id))
        .all(&*state.db)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn test_project_actor_shares_state_connection() {
    let (state, _) = common::create_test_state().await;
    let project = state
        .projects
        .create_project("demo", None, "owner-1")
        .await
        .unwrap();

    let stored = EProject::find_by_id(project.id)
        .one(&*state.db)
        .await
        .unwrap()
        .expect("project written by the actor is visible through the state");
    assert_eq!(stored.name, "demo");

    insert_build(&state, project.id, BuildStatus::Building).await;
    assert!(state.projects.get_project(project.id, "owner-1").await.is_ok());
    assert_eq!(
        EBuild::find()
            .filter(CBuild::Project.eq(project.id))
            .all(&*state.db)
            .await
            .unwrap()
            .len(),
        1
    );
}
