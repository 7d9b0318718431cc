/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Project actor: the single writer of project and file metadata.
//!
//! File bytes live in a [`ContentStore`] that shares no transaction with the
//! metadata store. Every mutation of one project runs under that project's
//! lock, and each operation orders its store writes so that a failure leaves
//! at worst an orphaned blob, never a file row pointing at missing bytes:
//!
//! - create: row, then blob (row removed again if the blob write fails)
//! - update: blob, then row
//! - delete: blob, then row
//! - move: new blob, verify, delete old blob, then swap rows in one transaction

use bytes::Bytes;
use chrono::{NaiveDateTime, SubsecRound, TimeDelta, Utc};
use entity::file::FileType;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::error::{CoreError, CoreResult};
use super::input::{
    check_project_name, file_name_of, is_within, join_path, parent_of, validate_file_name,
    validate_path,
};
use super::locks::KeyedLocks;
use super::storage::{ContentStore, StoreError, content_key, content_type_for};
use super::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub parent_path: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWithContent {
    #[serde(flatten)]
    pub file: MFile,
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub node: MFile,
    pub data: Option<Bytes>,
}

/// Point-in-time view of a project, taken under the project lock.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub project: MProject,
    pub entries: Vec<SnapshotEntry>,
}

impl ProjectSnapshot {
    pub fn files(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.data.as_ref().map(|data| (entry.node.path.as_str(), data)))
    }

    pub fn get(&self, path: &str) -> Option<&Bytes> {
        self.entries
            .iter()
            .find(|entry| entry.node.path == path)
            .and_then(|entry| entry.data.as_ref())
    }
}

pub struct ProjectActor {
    db: Arc<DatabaseConnection>,
    content: Arc<dyn ContentStore>,
    locks: KeyedLocks,
}

impl fmt::Debug for ProjectActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectActor")
            .field("content", &self.content)
            .field("locks", &self.locks.len())
            .finish()
    }
}

/// Current time truncated to the microsecond precision databases keep.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

/// Current time at database precision, strictly after `previous`.
pub fn next_timestamp(previous: NaiveDateTime) -> NaiveDateTime {
    let now = now();

    if now > previous {
        now
    } else {
        previous + TimeDelta::microseconds(1)
    }
}

impl ProjectActor {
    pub fn new(db: Arc<DatabaseConnection>, content: Arc<dyn ContentStore>) -> Self {
        ProjectActor {
            db,
            content,
            locks: KeyedLocks::default(),
        }
    }

    #[instrument(skip(self, description))]
    pub async fn create_project(
        &self,
        name: &str,
        description: Option<String>,
        owner: &str,
    ) -> CoreResult<MProject> {
        if owner.trim().is_empty() {
            return Err(CoreError::Unauthorized("Missing project owner".to_string()));
        }

        check_project_name(name).map_err(CoreError::Validation)?;

        let now = now();
        let aproject = AProject {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            description: Set(description),
            owner: Set(owner.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let project = aproject.insert(&*self.db).await?;
        info!(project_id = %project.id, "Created project");
        Ok(project)
    }

    pub async fn list_projects(&self, owner: &str) -> CoreResult<Vec<MProject>> {
        Ok(EProject::find()
            .filter(CProject::Owner.eq(owner))
            .order_by_desc(CProject::UpdatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Looks up a project on behalf of `owner`; another owner's project is
    /// reported as `Unauthorized`.
    pub async fn get_project(&self, project_id: Uuid, owner: &str) -> CoreResult<MProject> {
        let project = self.find_project(&*self.db, project_id).await?;

        if project.owner != owner {
            return Err(CoreError::Unauthorized(
                "Project belongs to another owner".to_string(),
            ));
        }

        Ok(project)
    }

    /// Directories first, then by name. Tree renderers depend on this order.
    pub async fn list_files(&self, project_id: Uuid) -> CoreResult<Vec<MFile>> {
        self.find_project(&*self.db, project_id).await?;

        let mut files = EFile::find()
            .filter(CFile::Project.eq(project_id))
            .all(&*self.db)
            .await?;

        files.sort_by(|a, b| {
            (!a.is_directory(), &a.name, &a.path).cmp(&(!b.is_directory(), &b.name, &b.path))
        });

        Ok(files)
    }

    #[instrument(skip(self))]
    pub async fn get_file(&self, project_id: Uuid, path: &str) -> CoreResult<FileWithContent> {
        validate_path(path).map_err(CoreError::Validation)?;
        let _guard = self.locks.lock(project_id).await;

        let file = self
            .find_file(&*self.db, project_id, path)
            .await?
            .ok_or_else(|| CoreError::file_not_found(path))?;

        if file.is_directory() {
            return Ok(FileWithContent {
                file,
                content: None,
            });
        }

        let object = self.read_blob(project_id, path).await?;

        Ok(FileWithContent {
            file,
            content: Some(String::from_utf8_lossy(&object).into_owned()),
        })
    }

    #[instrument(skip(self, new_file), fields(path = %new_file.path))]
    pub async fn create_file(&self, project_id: Uuid, new_file: NewFile) -> CoreResult<MFile> {
        let NewFile {
            path,
            name,
            file_type,
            parent_path,
            content,
        } = new_file;

        validate_path(&path).map_err(CoreError::Validation)?;

        if name != file_name_of(&path) {
            return Err(CoreError::Validation(format!(
                "Name `{}` does not match path `{}`",
                name, path
            )));
        }

        let derived_parent = parent_of(&path).map(str::to_string);
        if parent_path.is_some() && parent_path != derived_parent {
            return Err(CoreError::Validation(format!(
                "Parent path does not match path `{}`",
                path
            )));
        }

        let _guard = self.locks.lock(project_id).await;
        let project = self.find_project(&*self.db, project_id).await?;

        if let Some(parent) = &derived_parent {
            self.require_directory(&*self.db, project_id, parent).await?;
        }

        if self.find_file(&*self.db, project_id, &path).await?.is_some() {
            return Err(CoreError::already_exists(&format!("File {}", path)));
        }

        let data = match file_type {
            FileType::File => Some(Bytes::from(content.unwrap_or_default())),
            FileType::Directory => None,
        };

        let now = now();
        let afile = AFile {
            id: Set(Uuid::new_v4()),
            project: Set(project_id),
            path: Set(path.clone()),
            name: Set(name),
            file_type: Set(file_type),
            parent_path: Set(derived_parent),
            size: Set(data.as_ref().map_or(0, |data| data.len() as i64)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let file = afile.insert(&*self.db).await?;

        if let Some(data) = data {
            let key = content_key(project_id, &path);

            if let Err(e) = self.content.put(&key, data, content_type_for(&path)).await {
                error!(error = %e, "Content write failed, removing file record");

                if let Err(db_err) = EFile::delete_by_id(file.id).exec(&*self.db).await {
                    error!(error = %db_err, "Failed to remove file record after content failure");
                }

                return Err(e.into());
            }
        }

        self.touch_project(&*self.db, project).await?;
        debug!(file_id = %file.id, "Created file");
        Ok(file)
    }

    #[instrument(skip(self, content))]
    pub async fn update_file(
        &self,
        project_id: Uuid,
        path: &str,
        content: String,
    ) -> CoreResult<MFile> {
        validate_path(path).map_err(CoreError::Validation)?;
        let _guard = self.locks.lock(project_id).await;
        let project = self.find_project(&*self.db, project_id).await?;

        let file = self
            .find_file(&*self.db, project_id, path)
            .await?
            .ok_or_else(|| CoreError::file_not_found(path))?;

        if file.is_directory() {
            return Err(CoreError::Validation(format!(
                "{} is a directory and has no content",
                path
            )));
        }

        let data = Bytes::from(content);
        let size = data.len() as i64;

        self.content
            .put(&content_key(project_id, path), data, content_type_for(path))
            .await?;

        let updated_at = next_timestamp(file.updated_at);
        let mut afile = file.into_active_model();
        afile.size = Set(size);
        afile.updated_at = Set(updated_at);
        let file = afile.update(&*self.db).await?;

        self.touch_project(&*self.db, project).await?;
        Ok(file)
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, project_id: Uuid, path: &str) -> CoreResult<()> {
        validate_path(path).map_err(CoreError::Validation)?;
        let _guard = self.locks.lock(project_id).await;
        let project = self.find_project(&*self.db, project_id).await?;

        let file = self
            .find_file(&*self.db, project_id, path)
            .await?
            .ok_or_else(|| CoreError::file_not_found(path))?;

        if file.is_directory() {
            let children = EFile::find()
                .filter(CFile::Project.eq(project_id))
                .filter(CFile::ParentPath.eq(path))
                .count(&*self.db)
                .await?;

            if children > 0 {
                return Err(CoreError::Conflict(format!(
                    "Directory {} is not empty",
                    path
                )));
            }
        } else {
            // A failed blob delete must leave the record untouched.
            self.content.delete(&content_key(project_id, path)).await?;
        }

        EFile::delete_by_id(file.id).exec(&*self.db).await?;
        self.touch_project(&*self.db, project).await?;
        info!(file_id = %file.id, "Deleted file");
        Ok(())
    }

    /// Moves a file, or a directory with its whole subtree. Safe to re-run
    /// after an interruption: blobs already relocated are detected by their
    /// old key being gone while the new key exists.
    #[instrument(skip(self))]
    pub async fn move_file(&self, project_id: Uuid, from: &str, to: &str) -> CoreResult<MFile> {
        validate_path(from).map_err(CoreError::Validation)?;
        validate_path(to).map_err(CoreError::Validation)?;
        let _guard = self.locks.lock(project_id).await;
        let project = self.find_project(&*self.db, project_id).await?;

        let root = self
            .find_file(&*self.db, project_id, from)
            .await?
            .ok_or_else(|| CoreError::file_not_found(from))?;

        if from == to {
            return Ok(root);
        }

        if is_within(to, from) {
            return Err(CoreError::Validation(format!(
                "Cannot move {} into itself",
                from
            )));
        }

        if self.find_file(&*self.db, project_id, to).await?.is_some() {
            return Err(CoreError::already_exists(&format!("File {}", to)));
        }

        if let Some(parent) = parent_of(to) {
            self.require_directory(&*self.db, project_id, parent).await?;
        }

        let mut moved = vec![root];
        if moved[0].is_directory() {
            let descendants = EFile::find()
                .filter(CFile::Project.eq(project_id))
                .all(&*self.db)
                .await?
                .into_iter()
                .filter(|file| file.path != from && is_within(&file.path, from));
            moved.extend(descendants);
        }

        let relocate = |path: &str| format!("{}{}", to, &path[from.len()..]);

        for file in moved.iter().filter(|file| !file.is_directory()) {
            self.copy_blob(project_id, &file.path, &relocate(&file.path))
                .await?;
        }

        for file in moved.iter().filter(|file| !file.is_directory()) {
            self.content
                .delete(&content_key(project_id, &file.path))
                .await?;
        }

        let txn = self.db.begin().await?;
        let mut moved_root = None;

        for file in moved {
            let new_path = relocate(&file.path);
            let updated_at = next_timestamp(file.updated_at);
            let is_root = file.path == from;

            let mut afile = file.into_active_model();
            afile.name = Set(file_name_of(&new_path).to_string());
            afile.parent_path = Set(parent_of(&new_path).map(str::to_string));
            afile.path = Set(new_path);
            afile.updated_at = Set(updated_at);
            let updated = afile.update(&txn).await?;

            if is_root {
                moved_root = Some(updated);
            }
        }

        self.touch_project(&txn, project).await?;
        txn.commit().await?;

        info!("Moved {} to {}", from, to);
        moved_root.ok_or_else(|| CoreError::file_not_found(from))
    }

    pub async fn rename_file(
        &self,
        project_id: Uuid,
        path: &str,
        new_name: &str,
    ) -> CoreResult<MFile> {
        validate_path(path).map_err(CoreError::Validation)?;
        validate_file_name(new_name).map_err(CoreError::Validation)?;

        let to = join_path(parent_of(path), new_name);
        self.move_file(project_id, path, &to).await
    }

    /// Reads every node and blob of a project under its lock.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, project_id: Uuid) -> CoreResult<ProjectSnapshot> {
        let _guard = self.locks.lock(project_id).await;
        let project = self.find_project(&*self.db, project_id).await?;

        let nodes = EFile::find()
            .filter(CFile::Project.eq(project_id))
            .order_by_asc(CFile::Path)
            .all(&*self.db)
            .await?;

        let mut entries = Vec::with_capacity(nodes.len());
        for node in nodes {
            let data = if node.is_directory() {
                None
            } else {
                Some(self.read_blob(project_id, &node.path).await?)
            };

            entries.push(SnapshotEntry { node, data });
        }

        Ok(ProjectSnapshot { project, entries })
    }

    async fn find_project<C: ConnectionTrait>(
        &self,
        db: &C,
        project_id: Uuid,
    ) -> CoreResult<MProject> {
        EProject::find_by_id(project_id)
            .one(db)
            .await?
            .ok_or_else(|| CoreError::not_found("Project"))
    }

    async fn find_file<C: ConnectionTrait>(
        &self,
        db: &C,
        project_id: Uuid,
        path: &str,
    ) -> CoreResult<Option<MFile>> {
        Ok(EFile::find()
            .filter(CFile::Project.eq(project_id))
            .filter(CFile::Path.eq(path))
            .one(db)
            .await?)
    }

    async fn require_directory<C: ConnectionTrait>(
        &self,
        db: &C,
        project_id: Uuid,
        path: &str,
    ) -> CoreResult<()> {
        match self.find_file(db, project_id, path).await? {
            Some(parent) if parent.is_directory() => Ok(()),
            Some(_) => Err(CoreError::Validation(format!(
                "Parent {} is not a directory",
                path
            ))),
            None => Err(CoreError::Validation(format!(
                "Parent directory {} does not exist",
                path
            ))),
        }
    }

    async fn read_blob(&self, project_id: Uuid, path: &str) -> CoreResult<Bytes> {
        match self.content.get(&content_key(project_id, path)).await {
            Ok(object) => Ok(object.data),
            Err(StoreError::NotFound(_)) => Err(CoreError::file_not_found(path)),
            Err(e) => Err(e.into()),
        }
    }

    async fn copy_blob(&self, project_id: Uuid, from: &str, to: &str) -> CoreResult<()> {
        let source = content_key(project_id, from);
        let target = content_key(project_id, to);

        let object = match self.content.get(&source).await {
            Ok(object) => object,
            Err(StoreError::NotFound(_)) => {
                if self.content.exists(&target).await? {
                    debug!(from, to, "Blob already relocated");
                    return Ok(());
                }

                return Err(CoreError::file_not_found(from));
            }
            Err(e) => return Err(e.into()),
        };

        self.content
            .put(&target, object.data.clone(), content_type_for(to))
            .await?;

        let written = self.content.get(&target).await?;
        if written.data != object.data {
            return Err(StoreError::Unavailable(format!(
                "verification of {} failed after write",
                target
            ))
            .into());
        }

        Ok(())
    }

    async fn touch_project<C: ConnectionTrait>(&self, db: &C, project: MProject) -> CoreResult<()> {
        let updated_at = next_timestamp(project.updated_at);
        let mut aproject = project.into_active_model();
        aproject.updated_at = Set(updated_at);
        aproject.update(db).await?;
        Ok(())
    }
}
