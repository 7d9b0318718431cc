/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

mod common;

use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use common::{OWNER, TestApp};
use serde_json::json;
use workbench_core::project::FileWithContent;
use workbench_core::types::*;

async fn create_project(app: &TestApp, name: &str) -> MProject {
    let response = app
        .server
        .put("/api/projects")
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .json(&json!({ "name": name, "description": "test project" }))
        .await;
    response.assert_status_ok();
    response.json::<BaseResponse<MProject>>().message
}

async fn create_file(app: &TestApp, project: &MProject, path: &str, kind: &str, content: Option<&str>) -> StatusCode {
    let name = path.rsplit('/').next().unwrap();
    app.server
        .put(&format!("/api/projects/{}/files", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .json(&json!({
            "path": path,
            "name": name,
            "type": kind,
            "parent_path": null,
            "content": content,
        }))
        .await
        .status_code()
}

#[tokio::test]
async fn test_create_and_list_projects() {
    let app = common::create_test_app().await;
    let project = create_project(&app, "demo").await;
    assert_eq!(project.name, "demo");
    assert_eq!(project.owner, OWNER);

    let response = app
        .server
        .get("/api/projects")
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .await;
    response.assert_status_ok();
    let projects = response.json::<BaseResponse<Vec<MProject>>>().message;
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, project.id);

    let response = app
        .server
        .get("/api/projects")
        .add_header(AUTHORIZATION, common::bearer("owner-2"))
        .await;
    assert!(response.json::<BaseResponse<Vec<MProject>>>().message.is_empty());
}

#[tokio::test]
async fn test_create_project_validation() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .put("/api/projects")
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .json(&json!({ "name": "   " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .put("/api/projects")
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .json(&json!({ "title": "demo" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<BaseResponse<String>>().error);
}

#[tokio::test]
async fn test_other_owner_is_forbidden() {
    let app = common::create_test_app().await;
    let project = create_project(&app, "demo").await;
    assert_eq!(
        create_file(&app, &project, "index.html", "file", Some("<h1>hi</h1>")).await,
        StatusCode::OK
    );

    for path in [
        format!("/api/projects/{}", project.id),
        format!("/api/projects/{}/files", project.id),
        format!("/api/projects/{}/files/index.html", project.id),
    ] {
        let response = app
            .server
            .get(&path)
            .add_header(AUTHORIZATION, common::bearer("owner-2"))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    let response = app
        .server
        .delete(&format!("/api/projects/{}/files/index.html", project.id))
        .add_header(AUTHORIZATION, common::bearer("owner-2"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let file = app.state.projects.get_file(project.id, "index.html").await.unwrap();
    assert_eq!(file.content.as_deref(), Some("<h1>hi</h1>"));
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .get(&format!("/api/projects/{}", uuid::Uuid::new_v4()))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_lifecycle() {
    let app = common::create_test_app().await;
    let project = create_project(&app, "demo").await;

    assert_eq!(
        create_file(&app, &project, "index.html", "file", Some("<h1>hi</h1>")).await,
        StatusCode::OK
    );

    let response = app
        .server
        .get(&format!("/api/projects/{}/files", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .await;
    let files = response.json::<BaseResponse<Vec<MFile>>>().message;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "index.html");
    assert_eq!(files[0].size, 11);

    let response = app
        .server
        .patch(&format!("/api/projects/{}/files/index.html", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .json(&json!({ "content": "<h1>hello</h1>" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<BaseResponse<MFile>>().message.size, 14);

    let response = app
        .server
        .get(&format!("/api/projects/{}/files/index.html", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .await;
    response.assert_status_ok();
    let file = response.json::<BaseResponse<FileWithContent>>().message;
    assert_eq!(file.content.as_deref(), Some("<h1>hello</h1>"));
    assert_eq!(file.file.path, "index.html");

    let response = app
        .server
        .delete(&format!("/api/projects/{}/files/index.html", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .await;
    response.assert_status_ok();

    let response = app
        .server
        .get(&format!("/api/projects/{}/files/index.html", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_nested_paths_and_errors() {
    let app = common::create_test_app().await;
    let project = create_project(&app, "demo").await;

    assert_eq!(
        create_file(&app, &project, "src/main.js", "file", Some("")).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        create_file(&app, &project, "src", "directory", None).await,
        StatusCode::OK
    );
    assert_eq!(
        create_file(&app, &project, "src/main.js", "file", Some("main()")).await,
        StatusCode::OK
    );
    assert_eq!(
        create_file(&app, &project, "src/main.js", "file", Some("again")).await,
        StatusCode::CONFLICT
    );

    let response = app
        .server
        .get(&format!("/api/projects/{}/files/src/main.js", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .await;
    response.assert_status_ok();
    let file = response.json::<BaseResponse<FileWithContent>>().message;
    assert_eq!(file.content.as_deref(), Some("main()"));
    assert_eq!(file.file.parent_path.as_deref(), Some("src"));

    let response = app
        .server
        .delete(&format!("/api/projects/{}/files/src", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = app
        .server
        .patch(&format!("/api/projects/{}/files/src", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .json(&json!({ "content": "nope" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_move_and_rename() {
    let app = common::create_test_app().await;
    let project = create_project(&app, "demo").await;

    create_file(&app, &project, "pages", "directory", None).await;
    create_file(&app, &project, "about.html", "file", Some("<p>about</p>")).await;

    let response = app
        .server
        .post(&format!("/api/projects/{}/move", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .json(&json!({ "from": "about.html", "to": "pages/about.html" }))
        .await;
    response.assert_status_ok();
    let moved = response.json::<BaseResponse<MFile>>().message;
    assert_eq!(moved.path, "pages/about.html");

    let response = app
        .server
        .post(&format!("/api/projects/{}/rename", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .json(&json!({ "path": "pages/about.html", "name": "team.html" }))
        .await;
    response.assert_status_ok();
    let renamed = response.json::<BaseResponse<MFile>>().message;
    assert_eq!(renamed.path, "pages/team.html");
    assert_eq!(renamed.name, "team.html");

    let response = app
        .server
        .get(&format!("/api/projects/{}/files/pages/team.html", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .await;
    let file = response.json::<BaseResponse<FileWithContent>>().message;
    assert_eq!(file.content.as_deref(), Some("<p>about</p>"));

    let response = app
        .server
        .post(&format!("/api/projects/{}/move", project.id))
        .add_header(AUTHORIZATION, common::bearer(OWNER))
        .json(&json!({ "from": "pages", "to": "pages/inner" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
