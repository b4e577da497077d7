// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `colonic teardown` command - Stop the agent for every configured NIC.
//!
//! Setup ran in an earlier process, so every configured NIC is treated as
//! claimed.

use std::sync::Arc;

use colonic_core::{ConfigLoader, Operation, TokioExecutor};

use super::report::RunSummary;

pub async fn execute(config_path: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_file(config_path)?;

    tracing::info!(
        vm_id = %config.domain.id,
        mode = %config.domain.mode,
        nics = config.nics.len(),
        "Tearing down COLO agents"
    );

    let mut session = config.session(Arc::new(TokioExecutor::new()));
    session.claim_all();
    let reports = session.teardown_all().await;

    let summary = RunSummary::new(&config, Operation::Teardown, &reports);
    summary.print(json)?;

    if summary.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}
