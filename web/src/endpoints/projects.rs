/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::WebState;
use crate::auth::Owner;
use crate::error::WebResult;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use workbench_core::types::*;

#[derive(Serialize, Deserialize, Debug)]
pub struct MakeProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

pub async fn get(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
) -> WebResult<Json<BaseResponse<Vec<MProject>>>> {
    let projects = web.state.projects.list_projects(&owner.0).await?;

    let res = BaseResponse {
        error: false,
        message: projects,
    };

    Ok(Json(res))
}

pub async fn put(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    body: Result<Json<MakeProjectRequest>, JsonRejection>,
) -> WebResult<Json<BaseResponse<MProject>>> {
    let Json(body) = body?;

    let project = web
        .state
        .projects
        .create_project(&body.name, body.description, &owner.0)
        .await?;

    let res = BaseResponse {
        error: false,
        message: project,
    };

    Ok(Json(res))
}

pub async fn get_project(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path(project_id): Path<Uuid>,
) -> WebResult<Json<BaseResponse<MProject>>> {
    let project = web.state.projects.get_project(project_id, &owner.0).await?;

    let res = BaseResponse {
        error: false,
        message: project,
    };

    Ok(Json(res))
}
