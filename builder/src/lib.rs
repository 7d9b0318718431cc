/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod coordinator;
pub mod detect;
pub mod transform;

use coordinator::BuildCoordinator;
use std::sync::Arc;
use tracing::info;
use workbench_core::types::ServerState;

pub fn start_builder(state: Arc<ServerState>) -> Arc<BuildCoordinator> {
    info!(
        max_concurrent_builds = state.cli.max_concurrent_builds,
        "Starting build coordinator"
    );
    BuildCoordinator::new(state)
}
