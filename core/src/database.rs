/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use chrono::Utc;
use entity::build::BuildStatus;
use migration::Migrator;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectOptions, Database, DatabaseConnection,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter,
};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::log::LevelFilter;
use tracing::warn;
use uuid::Uuid;

use super::consts::RESTART_ERROR;
use super::types::*;

pub async fn connect_db(cli: &Cli) -> Result<DatabaseConnection> {
    let db_url = if let Some(file) = &cli.database_url_file {
        std::fs::read_to_string(file)
            .context("Failed to read database url from file")?
            .trim()
            .to_string()
    } else if let Some(url) = &cli.database_url {
        url.clone()
    } else {
        anyhow::bail!("No database url provided")
    };

    let sqlite = db_url.starts_with("sqlite:");
    let mut opt = ConnectOptions::new(db_url);

    // Only enable SQL logging at debug level
    if cli.log_level == "debug" {
        opt.sqlx_logging(true)
            .sqlx_logging_level(LevelFilter::Debug);
    } else {
        opt.sqlx_logging(false);
    }

    opt.connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8));

    if sqlite {
        // An in-memory database lives exactly as long as its single connection.
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(100)
            .min_connections(5)
            .idle_timeout(Duration::from_secs(8))
            .max_lifetime(Duration::from_secs(8));
    }

    let db = Database::connect(opt)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to run database migrations")?;
    update_db(&db).await.context("Failed to update database")?;
    Ok(db)
}

/// Fails every build a previous process left in a non-terminal state; their
/// background tasks died with that process.
pub async fn update_db(db: &DatabaseConnection) -> Result<(), DbErr> {
    let builds = EBuild::find()
        .filter(CBuild::Status.is_in(BuildStatus::ACTIVE))
        .all(db)
        .await?;

    for build in builds {
        warn!(build_id = %build.id, "Failing build interrupted by restart");

        let position = EBuildLog::find()
            .filter(CBuildLog::Build.eq(build.id))
            .count(db)
            .await?;

        let now = Utc::now().naive_utc();
        let build_id = build.id;

        let mut abuild: ABuild = build.into();
        abuild.status = Set(BuildStatus::Failed);
        abuild.error = Set(Some(RESTART_ERROR.to_string()));
        abuild.completed_at = Set(Some(now));
        abuild.update(db).await?;

        let alog = ABuildLog {
            id: Set(Uuid::new_v4()),
            build: Set(build_id),
            position: Set(position as i32),
            message: Set(format!("Build failed: {}", RESTART_ERROR)),
            created_at: Set(now),
        };
        alog.insert(db).await?;
    }

    Ok(())
}
