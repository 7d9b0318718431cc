/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod auth;
pub mod endpoints;
pub mod error;

use anyhow::{Context, Result};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use builder::coordinator::BuildCoordinator;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use workbench_core::types::ServerState;

#[derive(Clone, Debug)]
pub struct WebState {
    pub state: Arc<ServerState>,
    pub builds: Arc<BuildCoordinator>,
}

pub fn create_router(state: Arc<ServerState>, builds: Arc<BuildCoordinator>) -> Router {
    let web = WebState { state, builds };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/projects",
            get(endpoints::projects::get).put(endpoints::projects::put),
        )
        .route(
            "/api/projects/{project}",
            get(endpoints::projects::get_project),
        )
        .route(
            "/api/projects/{project}/files",
            get(endpoints::files::get).put(endpoints::files::put),
        )
        .route(
            "/api/projects/{project}/files/{*path}",
            get(endpoints::files::get_file)
                .patch(endpoints::files::patch_file)
                .delete(endpoints::files::delete_file),
        )
        .route(
            "/api/projects/{project}/move",
            post(endpoints::files::post_move),
        )
        .route(
            "/api/projects/{project}/rename",
            post(endpoints::files::post_rename),
        )
        .route("/api/builds", put(endpoints::builds::put))
        .route("/api/builds/{build}", get(endpoints::builds::get_build))
        .route(
            "/api/builds/{build}/log",
            get(endpoints::builds::get_build_log),
        )
        .route(
            "/api/builds/{build}/cancel",
            post(endpoints::builds::post_build_cancel),
        )
        .route_layer(middleware::from_fn_with_state(
            web.clone(),
            auth::authorize,
        ))
        .route("/api/health", get(endpoints::get_health))
        .route(
            "/preview/{project}/{build}/",
            get(endpoints::preview::get_index),
        )
        .route(
            "/preview/{project}/{build}/{*file}",
            get(endpoints::preview::get_file),
        )
        .fallback(endpoints::handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(web)
}

pub async fn serve_web(state: Arc<ServerState>, builds: Arc<BuildCoordinator>) -> Result<()> {
    let server_url = format!("{}:{}", state.cli.ip, state.cli.port);
    let app = create_router(state, builds);

    let listener = tokio::net::TcpListener::bind(&server_url)
        .await
        .with_context(|| format!("Failed to bind {}", server_url))?;

    info!("Listening on {}", server_url);
    axum::serve(listener, app)
        .await
        .context("Web server stopped")
}
