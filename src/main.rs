/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use workbench_core::types::Cli;
use workbench_core::{init_state, init_tracing};

#[tokio::main]
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let _guard = cli
        .sentry_dsn
        .as_deref()
        .map(|dsn| sentry::init(dsn));

    let state = init_state(cli).await?;
    let builds = builder::start_builder(Arc::clone(&state));
    web::serve_web(state, builds).await?;

    Ok(())
}
