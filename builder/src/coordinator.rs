/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use async_stream::stream;
use chrono::NaiveDateTime;
use entity::build::BuildStatus;
use futures::stream::BoxStream;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use workbench_core::error::{CoreError, CoreResult};
use workbench_core::locks::KeyedLocks;
use workbench_core::project::now;
use workbench_core::storage::{content_type_for, preview_key};
use workbench_core::types::*;

use super::detect::detect_profile;
use super::transform::{BuildArtifact, PassthroughTransformer, Transformer};

pub const CANCELLED: &str = "cancelled";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub project_id: Uuid,
    pub build_command: Option<String>,
    pub install_command: Option<String>,
    pub output_dir: Option<String>,
}

impl BuildConfig {
    fn reserved(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("installCommand", &self.install_command),
            ("buildCommand", &self.build_command),
            ("outputDir", &self.output_dir),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|value| (field, value)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: NaiveDateTime,
    pub message: String,
}

impl From<MBuildLog> for LogLine {
    fn from(log: MBuildLog) -> Self {
        LogLine {
            timestamp: log.created_at,
            message: log.message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    #[serde(flatten)]
    pub build: MBuild,
    pub logs: Vec<LogLine>,
}

pub fn preview_url(project: Uuid, build: Uuid) -> String {
    format!("/preview/{}/{}/", project, build)
}

/// Runs builds in the background. Every status write is a compare-and-set
/// under the build's lock, so once a build is terminal nothing else is
/// written for it.
pub struct BuildCoordinator {
    state: Arc<ServerState>,
    permits: Arc<Semaphore>,
    locks: KeyedLocks,
    transformer: Arc<dyn Transformer>,
    poll_interval: Duration,
}

impl fmt::Debug for BuildCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildCoordinator")
            .field("available_permits", &self.permits.available_permits())
            .field("transformer", &self.transformer)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl BuildCoordinator {
    pub fn new(state: Arc<ServerState>) -> Arc<Self> {
        Self::with_transformer(state, Arc::new(PassthroughTransformer))
    }

    pub fn with_transformer(
        state: Arc<ServerState>,
        transformer: Arc<dyn Transformer>,
    ) -> Arc<Self> {
        let permits = Arc::new(Semaphore::new(state.cli.max_concurrent_builds));
        let poll_interval = Duration::from_millis(state.cli.log_poll_interval_ms);

        Arc::new(BuildCoordinator {
            state,
            permits,
            locks: KeyedLocks::default(),
            transformer,
            poll_interval,
        })
    }

    /// Records a pending build and returns it; the phases run on a detached
    /// task.
    #[instrument(skip(self, config), fields(project_id = %config.project_id))]
    pub async fn start_build(self: &Arc<Self>, config: BuildConfig, owner: &str) -> CoreResult<MBuild> {
        self.state
            .projects
            .get_project(config.project_id, owner)
            .await?;

        let abuild = ABuild {
            id: Set(Uuid::new_v4()),
            project: Set(config.project_id),
            status: Set(BuildStatus::Pending),
            preview_url: Set(None),
            error: Set(None),
            started_at: Set(now()),
            completed_at: Set(None),
        };

        let build = abuild.insert(&*self.state.db).await?;
        info!(build_id = %build.id, "Queued build");

        let coordinator = Arc::clone(self);
        let build_id = build.id;
        tokio::spawn(async move { coordinator.run(build_id, config).await });

        Ok(build)
    }

    pub async fn get_build(&self, build_id: Uuid) -> CoreResult<MBuild> {
        EBuild::find_by_id(build_id)
            .one(&*self.state.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Build"))
    }

    pub async fn get_status(&self, build_id: Uuid) -> CoreResult<BuildReport> {
        let build = self.get_build(build_id).await?;

        let logs = EBuildLog::find()
            .filter(CBuildLog::Build.eq(build_id))
            .order_by_asc(CBuildLog::Position)
            .all(&*self.state.db)
            .await?
            .into_iter()
            .map(LogLine::from)
            .collect();

        Ok(BuildReport { build, logs })
    }

    /// Streams every log line of a build in order. The stream ends once the
    /// build is terminal and its last line has been yielded.
    pub async fn get_logs(
        &self,
        build_id: Uuid,
    ) -> CoreResult<BoxStream<'static, LogLine>> {
        self.get_build(build_id).await?;

        let state = Arc::clone(&self.state);
        let poll_interval = self.poll_interval;

        Ok(Box::pin(stream! {
            let mut next_position = 0;
            let mut interval = time::interval(poll_interval);

            loop {
                interval.tick().await;

                // Status first: the terminal line is committed together with
                // the terminal status, so it is visible to the read below.
                let build = match EBuild::find_by_id(build_id).one(&*state.db).await {
                    Ok(Some(build)) => build,
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, %build_id, "Failed to poll build status");
                        break;
                    }
                };

                let logs = match EBuildLog::find()
                    .filter(CBuildLog::Build.eq(build_id))
                    .filter(CBuildLog::Position.gte(next_position))
                    .order_by_asc(CBuildLog::Position)
                    .all(&*state.db)
                    .await
                {
                    Ok(logs) => logs,
                    Err(e) => {
                        error!(error = %e, %build_id, "Failed to poll build log");
                        break;
                    }
                };

                for log in logs {
                    next_position = log.position + 1;
                    yield LogLine::from(log);
                }

                if build.status.is_terminal() {
                    break;
                }
            }
        }))
    }

    /// Fails a running build. Cancelling a terminal build changes nothing.
    #[instrument(skip(self))]
    pub async fn cancel_build(&self, build_id: Uuid) -> CoreResult<MBuild> {
        let build = self.get_build(build_id).await?;

        if build.status.is_terminal() {
            debug!("Build already terminal, nothing to cancel");
            return Ok(build);
        }

        match self
            .finish(
                build_id,
                &BuildStatus::ACTIVE,
                BuildStatus::Failed,
                None,
                Some(CANCELLED.to_string()),
                "Build cancelled".to_string(),
            )
            .await
        {
            Ok(()) => info!("Cancelled build"),
            Err(CoreError::Cancelled) => debug!("Build finished before it could be cancelled"),
            Err(e) => return Err(e),
        }

        self.get_build(build_id).await
    }

    #[instrument(skip(self, config))]
    async fn run(self: Arc<Self>, build_id: Uuid, config: BuildConfig) {
        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Build pool closed");
                self.fail(build_id, &e.to_string()).await;
                return;
            }
        };

        match self.execute(build_id, &config).await {
            Ok(url) => {
                let result = self
                    .finish(
                        build_id,
                        &[BuildStatus::Building],
                        BuildStatus::Success,
                        Some(url.clone()),
                        None,
                        format!("Build succeeded, preview available at {}", url),
                    )
                    .await;

                match result {
                    Ok(()) => info!(preview_url = %url, "Build succeeded"),
                    Err(CoreError::Cancelled) => debug!("Build was cancelled before completion"),
                    Err(e) => {
                        error!(error = %e, "Failed to record build success");
                        self.fail(build_id, &e.to_string()).await;
                    }
                }
            }
            Err(CoreError::Cancelled) => debug!("Build was cancelled, stopping"),
            Err(e) => {
                warn!(error = %e, "Build failed");
                self.fail(build_id, &e.to_string()).await;
            }
        }
    }

    async fn execute(&self, build_id: Uuid, config: &BuildConfig) -> CoreResult<String> {
        self.advance(build_id, BuildStatus::Pending, BuildStatus::Installing)
            .await?;

        let snapshot = self.state.projects.snapshot(config.project_id).await?;
        self.append_log(
            build_id,
            format!("Fetched {} files", snapshot.files().count()),
        )
        .await?;

        for (field, value) in config.reserved() {
            self.append_log(
                build_id,
                format!("{} is reserved and was not executed: {}", field, value),
            )
            .await?;
        }

        let profile = detect_profile(&snapshot)?;
        self.append_log(build_id, format!("Detected profile: {}", profile))
            .await?;

        self.advance(build_id, BuildStatus::Installing, BuildStatus::Building)
            .await?;

        let artifacts = self.transformer.transform(&snapshot, &profile).await?;
        self.append_log(
            build_id,
            format!("Built {} output files", artifacts.len()),
        )
        .await?;

        self.deploy(config.project_id, build_id, artifacts).await
    }

    async fn deploy(
        &self,
        project_id: Uuid,
        build_id: Uuid,
        artifacts: Vec<BuildArtifact>,
    ) -> CoreResult<String> {
        // Last phase boundary before writing preview artifacts.
        self.append_log(build_id, "Deploying preview".to_string())
            .await?;

        for artifact in artifacts {
            let key = preview_key(project_id, build_id, &artifact.path);
            self.state
                .content
                .put(&key, artifact.data, content_type_for(&artifact.path))
                .await?;
        }

        Ok(preview_url(project_id, build_id))
    }

    async fn fail(&self, build_id: Uuid, message: &str) {
        let result = self
            .finish(
                build_id,
                &BuildStatus::ACTIVE,
                BuildStatus::Failed,
                None,
                Some(message.to_string()),
                format!("Build failed: {}", message),
            )
            .await;

        match result {
            Ok(()) | Err(CoreError::Cancelled) => {}
            Err(e) => error!(error = %e, %build_id, "Failed to record build failure"),
        }
    }

    /// `from → to` for a non-terminal target. `Cancelled` when the build is no
    /// longer in `from`.
    async fn advance(&self, build_id: Uuid, from: BuildStatus, to: BuildStatus) -> CoreResult<()> {
        let _guard = self.locks.lock(build_id).await;

        let result = EBuild::update_many()
            .set(ABuild {
                status: Set(to),
                ..Default::default()
            })
            .filter(CBuild::Id.eq(build_id))
            .filter(CBuild::Status.eq(from))
            .exec(&*self.state.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(CoreError::Cancelled);
        }

        debug!(%build_id, status = ?to, "Advanced build");
        Ok(())
    }

    /// Moves a build into a terminal state and writes its final log line in
    /// the same transaction.
    async fn finish(
        &self,
        build_id: Uuid,
        from: &[BuildStatus],
        to: BuildStatus,
        preview_url: Option<String>,
        error: Option<String>,
        message: String,
    ) -> CoreResult<()> {
        let _guard = self.locks.lock(build_id).await;
        let txn = self.state.db.begin().await?;

        let result = EBuild::update_many()
            .set(ABuild {
                status: Set(to),
                preview_url: Set(preview_url),
                error: Set(error),
                completed_at: Set(Some(now())),
                ..Default::default()
            })
            .filter(CBuild::Id.eq(build_id))
            .filter(CBuild::Status.is_in(from.iter().copied()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(CoreError::Cancelled);
        }

        insert_log(&txn, build_id, message).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Appends a line to a running build. `Cancelled` once the build is
    /// terminal.
    async fn append_log(&self, build_id: Uuid, message: String) -> CoreResult<()> {
        let _guard = self.locks.lock(build_id).await;
        let build = self.get_build(build_id).await?;

        if build.status.is_terminal() {
            return Err(CoreError::Cancelled);
        }

        debug!(%build_id, "{}", message);
        insert_log(&*self.state.db, build_id, message).await
    }
}

async fn insert_log<C: ConnectionTrait>(db: &C, build_id: Uuid, message: String) -> CoreResult<()> {
    let position = EBuildLog::find()
        .filter(CBuildLog::Build.eq(build_id))
        .count(db)
        .await?;

    let alog = ABuildLog {
        id: Set(Uuid::new_v4()),
        build: Set(build_id),
        position: Set(position as i32),
        message: Set(message),
        created_at: Set(now()),
    };

    alog.insert(db).await?;
    Ok(())
}
