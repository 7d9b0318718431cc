/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! File tree routes. Every handler confirms project ownership before the
//! project actor is asked to touch either store.

use crate::WebState;
use crate::auth::Owner;
use crate::error::WebResult;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use workbench_core::project::{FileWithContent, NewFile};
use workbench_core::types::*;

#[derive(Serialize, Deserialize, Debug)]
pub struct PatchFileRequest {
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MoveFileRequest {
    pub from: String,
    pub to: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RenameFileRequest {
    pub path: String,
    pub name: String,
}

pub async fn get(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path(project_id): Path<Uuid>,
) -> WebResult<Json<BaseResponse<Vec<MFile>>>> {
    web.state.projects.get_project(project_id, &owner.0).await?;
    let files = web.state.projects.list_files(project_id).await?;

    let res = BaseResponse {
        error: false,
        message: files,
    };

    Ok(Json(res))
}

pub async fn put(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path(project_id): Path<Uuid>,
    body: Result<Json<NewFile>, JsonRejection>,
) -> WebResult<Json<BaseResponse<MFile>>> {
    let Json(body) = body?;

    web.state.projects.get_project(project_id, &owner.0).await?;
    let file = web.state.projects.create_file(project_id, body).await?;

    let res = BaseResponse {
        error: false,
        message: file,
    };

    Ok(Json(res))
}

pub async fn get_file(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path((project_id, path)): Path<(Uuid, String)>,
) -> WebResult<Json<BaseResponse<FileWithContent>>> {
    web.state.projects.get_project(project_id, &owner.0).await?;
    let file = web.state.projects.get_file(project_id, &path).await?;

    let res = BaseResponse {
        error: false,
        message: file,
    };

    Ok(Json(res))
}

pub async fn patch_file(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path((project_id, path)): Path<(Uuid, String)>,
    body: Result<Json<PatchFileRequest>, JsonRejection>,
) -> WebResult<Json<BaseResponse<MFile>>> {
    let Json(body) = body?;

    web.state.projects.get_project(project_id, &owner.0).await?;
    let file = web
        .state
        .projects
        .update_file(project_id, &path, body.content)
        .await?;

    let res = BaseResponse {
        error: false,
        message: file,
    };

    Ok(Json(res))
}

pub async fn delete_file(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path((project_id, path)): Path<(Uuid, String)>,
) -> WebResult<Json<BaseResponse<String>>> {
    web.state.projects.get_project(project_id, &owner.0).await?;
    web.state.projects.delete_file(project_id, &path).await?;

    let res = BaseResponse {
        error: false,
        message: "File deleted".to_string(),
    };

    Ok(Json(res))
}

pub async fn post_move(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path(project_id): Path<Uuid>,
    body: Result<Json<MoveFileRequest>, JsonRejection>,
) -> WebResult<Json<BaseResponse<MFile>>> {
    let Json(body) = body?;

    web.state.projects.get_project(project_id, &owner.0).await?;
    let file = web
        .state
        .projects
        .move_file(project_id, &body.from, &body.to)
        .await?;

    let res = BaseResponse {
        error: false,
        message: file,
    };

    Ok(Json(res))
}

pub async fn post_rename(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path(project_id): Path<Uuid>,
    body: Result<Json<RenameFileRequest>, JsonRejection>,
) -> WebResult<Json<BaseResponse<MFile>>> {
    let Json(body) = body?;

    web.state.projects.get_project(project_id, &owner.0).await?;
    let file = web
        .state
        .projects
        .rename_file(project_id, &body.path, &body.name)
        .await?;

    let res = BaseResponse {
        error: false,
        message: file,
    };

    Ok(Json(res))
}
