// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shared rendering of per-device outcomes for `setup` and `teardown`.

use serde::Serialize;

use colonic_core::{Config, DeviceId, DeviceReport, Mode, Operation};

/// One device's outcome, as printed.
#[derive(Debug, Serialize)]
pub struct OutcomeLine {
    pub devid: DeviceId,
    pub vif: Option<String>,
    pub ok: bool,
    pub cause: Option<&'static str>,
    pub message: Option<String>,
}

impl From<&DeviceReport> for OutcomeLine {
    fn from(report: &DeviceReport) -> Self {
        let (cause, message) = match &report.outcome {
            Ok(()) => (None, None),
            Err(e) => (Some(e.cause()), Some(e.to_string())),
        };

        Self {
            devid: report.device.devid(),
            vif: report
                .device
                .interface
                .as_ref()
                .map(|name| name.as_str().to_string()),
            ok: report.outcome.is_ok(),
            cause,
            message,
        }
    }
}

/// Full result of one fan-out.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub vm_id: u32,
    pub mode: Mode,
    pub op: Operation,
    pub devices: Vec<OutcomeLine>,
}

impl RunSummary {
    pub fn new(config: &Config, op: Operation, reports: &[DeviceReport]) -> Self {
        Self {
            vm_id: config.domain.id.value(),
            mode: config.domain.mode,
            op,
            devices: reports.iter().map(OutcomeLine::from).collect(),
        }
    }

    pub fn failed(&self) -> usize {
        self.devices.iter().filter(|d| !d.ok).count()
    }

    /// Print to stdout, as JSON or as a human-readable listing.
    pub fn print(&self, json: bool) -> Result<(), Box<dyn std::error::Error>> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        println!("Domain {} ({}) {}:", self.vm_id, self.mode, self.op);
        if self.devices.is_empty() {
            println!("  No devices to {}.", self.op);
            return Ok(());
        }

        for line in &self.devices {
            let vif = line.vif.as_deref().unwrap_or("-");
            match &line.message {
                None => println!("  ✓ NIC {:<4} {:<16} ok", line.devid, vif),
                Some(message) => println!("  ✗ NIC {:<4} {:<16} {}", line.devid, vif, message),
            }
        }

        println!();
        println!(
            "Total: {} device(s), {} failed",
            self.devices.len(),
            self.failed()
        );
        Ok(())
    }
}
