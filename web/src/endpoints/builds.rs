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
use axum_streams::StreamBodyAs;
use builder::coordinator::{BuildConfig, BuildReport};
use uuid::Uuid;
use workbench_core::types::*;

async fn get_owned_build(web: &WebState, owner: &Owner, build_id: Uuid) -> WebResult<MBuild> {
    let build = web.builds.get_build(build_id).await?;
    web.state.projects.get_project(build.project, &owner.0).await?;
    Ok(build)
}

pub async fn put(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    body: Result<Json<BuildConfig>, JsonRejection>,
) -> WebResult<Json<BaseResponse<MBuild>>> {
    let Json(body) = body?;

    let build = web.builds.start_build(body, &owner.0).await?;

    let res = BaseResponse {
        error: false,
        message: build,
    };

    Ok(Json(res))
}

pub async fn get_build(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path(build_id): Path<Uuid>,
) -> WebResult<Json<BaseResponse<BuildReport>>> {
    get_owned_build(&web, &owner, build_id).await?;
    let report = web.builds.get_status(build_id).await?;

    let res = BaseResponse {
        error: false,
        message: report,
    };

    Ok(Json(res))
}

pub async fn get_build_log(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path(build_id): Path<Uuid>,
) -> WebResult<StreamBodyAs<'static>> {
    get_owned_build(&web, &owner, build_id).await?;
    let stream = web.builds.get_logs(build_id).await?;

    Ok(StreamBodyAs::json_nl(stream))
}

pub async fn post_build_cancel(
    State(web): State<WebState>,
    Extension(owner): Extension<Owner>,
    Path(build_id): Path<Uuid>,
) -> WebResult<Json<BaseResponse<MBuild>>> {
    get_owned_build(&web, &owner, build_id).await?;
    let build = web.builds.cancel_build(build_id).await?;

    let res = BaseResponse {
        error: false,
        message: build,
    };

    Ok(Json(res))
}
