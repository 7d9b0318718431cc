/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::storage::StoreError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Failures raised by project and build operations. `ContentStore` and
/// `Database` together form the store-failure class and are never retried.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Validation(String),
    #[error("content store failure: {0}")]
    ContentStore(#[from] StoreError),
    #[error("metadata store failure: {0}")]
    Database(DbErr),
    #[error("cancelled")]
    Cancelled,
}

impl From<DbErr> for CoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                CoreError::Conflict(format!("Record already exists: {}", msg))
            }
            _ => CoreError::Database(err),
        }
    }
}

impl CoreError {
    pub fn not_found(resource: &str) -> Self {
        CoreError::NotFound(format!("{} not found", resource))
    }

    pub fn file_not_found(path: &str) -> Self {
        CoreError::NotFound(format!("File {} not found", path))
    }

    pub fn already_exists(resource: &str) -> Self {
        CoreError::Conflict(format!("{} already exists", resource))
    }

    pub fn is_store_failure(&self) -> bool {
        matches!(self, CoreError::ContentStore(_) | CoreError::Database(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
