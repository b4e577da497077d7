// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Agent script invocation builder.
//!
//! The agent receives its parameters through the environment and the
//! operation as its only argument:
//!
//! | variable      | value                               |
//! |---------------|-------------------------------------|
//! | `vifname`     | host interface name                 |
//! | `XENBUS_PATH` | `/libxl/<domid>/colo_agent/<devid>` |
//! | `forwarddev`  | forwarding device                   |
//! | `mode`        | `primary` or `secondary`            |
//! | `vmid`        | domain id                           |

use std::time::Duration;

use crate::device::NicDevice;
use crate::error::DeviceFailure;
use crate::exec::Invocation;
use crate::paths;
use crate::types::{DomainId, Mode, Operation, ScriptPath};

/// Upper bound on one agent run, shared with the other hotplug scripts.
pub const HOTPLUG_TIMEOUT_MS: u64 = 40_000;

pub const ENV_VIFNAME: &str = "vifname";
pub const ENV_XENBUS_PATH: &str = "XENBUS_PATH";
pub const ENV_FORWARDDEV: &str = "forwarddev";
pub const ENV_MODE: &str = "mode";
pub const ENV_VMID: &str = "vmid";

/// Builds invocations of one agent script for one domain.
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    domid: DomainId,
    script: ScriptPath,
    timeout: Duration,
}

impl InvocationBuilder {
    pub fn new(domid: DomainId, script: ScriptPath, timeout: Duration) -> Self {
        Self {
            domid,
            script,
            timeout,
        }
    }

    /// Describe one agent run for `device`. Starts nothing.
    ///
    /// # Errors
    /// `DeviceFailure::Validation` if the forward device or the interface
    /// name is missing or empty.
    pub fn build(
        &self,
        device: &NicDevice,
        mode: Mode,
        operation: Operation,
    ) -> Result<Invocation, DeviceFailure> {
        let forwarddev = device
            .forwarddev
            .as_deref()
            .filter(|dev| !dev.is_empty())
            .ok_or(DeviceFailure::Validation {
                devid: device.devid,
                field: "forwarddev",
            })?;

        let vif = device
            .interface
            .as_ref()
            .filter(|vif| !vif.as_str().is_empty())
            .ok_or(DeviceFailure::Validation {
                devid: device.devid,
                field: "vifname",
            })?;

        let env = vec![
            (ENV_VIFNAME.to_string(), vif.to_string()),
            (
                ENV_XENBUS_PATH.to_string(),
                paths::agent_path(self.domid, device.devid),
            ),
            (ENV_FORWARDDEV.to_string(), forwarddev.to_string()),
            (ENV_MODE.to_string(), mode.as_str().to_string()),
            (ENV_VMID.to_string(), self.domid.to_string()),
        ];

        Ok(Invocation::new(
            self.script.clone(),
            operation,
            env,
            self.timeout,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::types::{DeviceId, InterfaceName};

    fn builder() -> InvocationBuilder {
        InvocationBuilder::new(
            DomainId::new(3).unwrap(),
            ScriptPath::new("/agents/colo.sh"),
            Duration::from_millis(HOTPLUG_TIMEOUT_MS),
        )
    }

    fn device(forwarddev: Option<&str>, vif: Option<&str>) -> NicDevice {
        NicDevice {
            devid: DeviceId::new(7),
            forwarddev: forwarddev.map(str::to_string),
            interface: vif.map(|v| InterfaceName::new(v).unwrap()),
        }
    }

    #[test]
    fn test_build_setup() {
        let inv = builder()
            .build(&device(Some("eth0"), Some("vif3.7")), Mode::Primary, Operation::Setup)
            .unwrap();

        assert_eq!(inv.argv(), ["/agents/colo.sh", "setup"]);
        assert_eq!(inv.what(), "/agents/colo.sh setup");
        assert_eq!(inv.env_var("vifname"), Some("vif3.7"));
        assert_eq!(inv.env_var("XENBUS_PATH"), Some("/libxl/3/colo_agent/7"));
        assert_eq!(inv.env_var("forwarddev"), Some("eth0"));
        assert_eq!(inv.env_var("mode"), Some("primary"));
        assert_eq!(inv.env_var("vmid"), Some("3"));
        assert_eq!(inv.timeout(), Duration::from_secs(40));
    }

    #[test]
    fn test_env_keys_unique_and_complete() {
        let inv = builder()
            .build(&device(Some("eth0"), Some("vif3.7")), Mode::Secondary, Operation::Teardown)
            .unwrap();

        let keys: HashSet<&str> = inv.env().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys.len(), inv.env().len());
        assert_eq!(
            keys,
            HashSet::from([ENV_VIFNAME, ENV_XENBUS_PATH, ENV_FORWARDDEV, ENV_MODE, ENV_VMID])
        );
    }

    #[test]
    fn test_mode_and_operation_matrix() {
        for mode in [Mode::Primary, Mode::Secondary] {
            for op in [Operation::Setup, Operation::Teardown] {
                let inv = builder()
                    .build(&device(Some("eth0"), Some("vif3.7")), mode, op)
                    .unwrap();
                assert_eq!(inv.argv()[1], op.as_str());
                assert_eq!(inv.env_var("mode"), Some(mode.as_str()));
            }
        }
    }

    #[test]
    fn test_missing_forwarddev() {
        for forwarddev in [None, Some("")] {
            let err = builder()
                .build(&device(forwarddev, Some("vif3.7")), Mode::Primary, Operation::Setup)
                .unwrap_err();
            assert!(matches!(
                err,
                DeviceFailure::Validation { field: "forwarddev", .. }
            ));
        }
    }

    #[test]
    fn test_missing_interface() {
        let err = builder()
            .build(&device(Some("eth0"), None), Mode::Primary, Operation::Setup)
            .unwrap_err();
        assert!(matches!(err, DeviceFailure::Validation { field: "vifname", .. }));
    }
}
