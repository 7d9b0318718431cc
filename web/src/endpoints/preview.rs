/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::WebState;
use crate::error::{WebError, WebResult};
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;
use workbench_core::consts::PREVIEW_INDEX;
use workbench_core::input::validate_path;
use workbench_core::storage::{StoreError, preview_key};

pub async fn get_index(
    State(web): State<WebState>,
    Path((project_id, build_id)): Path<(String, String)>,
) -> WebResult<Response> {
    serve(&web, &project_id, &build_id, PREVIEW_INDEX).await
}

pub async fn get_file(
    State(web): State<WebState>,
    Path((project_id, build_id, file)): Path<(String, String, String)>,
) -> WebResult<Response> {
    let file = if file.is_empty() || file.ends_with('/') {
        format!("{}{}", file, PREVIEW_INDEX)
    } else {
        file
    };

    serve(&web, &project_id, &build_id, &file).await
}

async fn serve(web: &WebState, project_id: &str, build_id: &str, file: &str) -> WebResult<Response> {
    let project_id = Uuid::parse_str(project_id).map_err(|_| WebError::not_found("File"))?;
    let build_id = Uuid::parse_str(build_id).map_err(|_| WebError::not_found("File"))?;
    validate_path(file).map_err(|_| WebError::not_found("File"))?;

    let key = preview_key(project_id, build_id, file);
    let object = match web.state.content.get(&key).await {
        Ok(object) => object,
        Err(StoreError::NotFound(_)) => return Err(WebError::not_found("File")),
        Err(e) => return Err(WebError::ContentStore(e)),
    };

    Ok(([(CONTENT_TYPE, object.content_type)], object.data).into_response())
}
