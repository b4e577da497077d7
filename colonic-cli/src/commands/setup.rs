// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `colonic setup` command - Start the agent for every configured NIC.

use std::sync::Arc;

use colonic_core::{ConfigLoader, Operation, TokioExecutor};

use super::report::RunSummary;

pub async fn execute(config_path: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_file(config_path)?;

    tracing::info!(
        vm_id = %config.domain.id,
        mode = %config.domain.mode,
        nics = config.nics.len(),
        "Setting up COLO agents"
    );

    let mut session = config.session(Arc::new(TokioExecutor::new()));
    let reports = session.setup_all().await;

    let summary = RunSummary::new(&config, Operation::Setup, &reports);
    summary.print(json)?;

    if summary.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}
