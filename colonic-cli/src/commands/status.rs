// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `colonic status` command - Show the resolved interface and hotplug status
//! record of each configured NIC.
//!
//! Read-only: no agent is started.

use serde::Serialize;

use colonic_core::{paths, resolve_interface_name, ConfigLoader, DeviceId, DirStore, Store};

#[derive(Debug, Serialize)]
struct NicStatus {
    devid: DeviceId,
    vif: Option<String>,
    forwarddev: Option<String>,
    hotplug_error: Option<String>,
    store_error: Option<String>,
}

impl NicStatus {
    fn healthy(&self) -> bool {
        self.hotplug_error.is_none() && self.store_error.is_none()
    }
}

pub async fn execute(config_path: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_file(config_path)?;
    let store = DirStore::new(&config.store.root);
    let domid = config.domain.id;

    let mut statuses = Vec::with_capacity(config.nics.len());
    for nic in &config.nics {
        let mut status = NicStatus {
            devid: nic.devid,
            vif: None,
            forwarddev: nic.forwarddev.clone(),
            hotplug_error: None,
            store_error: None,
        };

        match resolve_interface_name(&store, domid, nic.devid, nic.nictype) {
            Ok(name) => status.vif = name.map(|n| n.as_str().to_string()),
            Err(e) => status.store_error = Some(e.to_string()),
        }

        match store.read(&paths::hotplug_error_path(domid, nic.devid)) {
            Ok(record) => status.hotplug_error = record,
            Err(e) => status.store_error = Some(e.to_string()),
        }

        tracing::debug!(
            vm_id = %domid,
            devid = %nic.devid,
            healthy = status.healthy(),
            "Read NIC status"
        );
        statuses.push(status);
    }

    let unhealthy = statuses.iter().filter(|s| !s.healthy()).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        println!("Domain {} ({}):", domid, config.domain.mode);
        for status in &statuses {
            let vif = status.vif.as_deref().unwrap_or("-");
            let state = match (&status.store_error, &status.hotplug_error) {
                (Some(e), _) => format!("store error: {}", e),
                (None, Some(record)) => format!("hotplug error: {}", record),
                (None, None) => "ok".to_string(),
            };
            println!(
                "  NIC {:<4} {:<16} forwarddev={:<10} {}",
                status.devid,
                vif,
                status.forwarddev.as_deref().unwrap_or("-"),
                state
            );
        }
        println!();
        println!(
            "Total: {} NIC(s), {} with errors",
            statuses.len(),
            unhealthy
        );
    }

    if unhealthy > 0 {
        std::process::exit(1);
    }
    Ok(())
}
