/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub use sea_orm_migration::prelude::*;

mod m20261015_000000_create_table_project;
mod m20261015_000100_create_table_file;
mod m20261015_000200_create_table_build;
mod m20261015_000300_create_table_build_log;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261015_000000_create_table_project::Migration),
            Box::new(m20261015_000100_create_table_file::Migration),
            Box::new(m20261015_000200_create_table_build::Migration),
            Box::new(m20261015_000300_create_table_build_log::Migration),
        ]
    }
}
