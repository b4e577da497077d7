// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Well-known store paths read by the controller.

use crate::types::{DeviceId, DomainId};

/// Store home of the control domain, which owns every netback device.
pub const CONTROL_DOMAIN_PATH: &str = "/local/domain/0";

/// Toolstack-private subtree.
pub const LIBXL_PATH: &str = "/libxl";

/// Node written by the hotplug infrastructure when the agent failed.
pub const HOTPLUG_ERROR_NODE: &str = "hotplug-error";

/// Explicitly assigned interface name of a NIC backend.
pub fn vifname_path(domid: DomainId, devid: DeviceId) -> String {
    format!("{}/backend/vif/{}/{}/vifname", CONTROL_DOMAIN_PATH, domid, devid)
}

/// Per-device agent directory, exported to the script as `XENBUS_PATH`.
pub fn agent_path(domid: DomainId, devid: DeviceId) -> String {
    format!("{}/{}/colo_agent/{}", LIBXL_PATH, domid, devid)
}

/// Status record read after setup.
pub fn hotplug_error_path(domid: DomainId, devid: DeviceId) -> String {
    format!("{}/{}", agent_path(domid, devid), HOTPLUG_ERROR_NODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let domid = DomainId::new(3).unwrap();
        let devid = DeviceId::new(7);

        assert_eq!(vifname_path(domid, devid), "/local/domain/0/backend/vif/3/7/vifname");
        assert_eq!(agent_path(domid, devid), "/libxl/3/colo_agent/7");
        assert_eq!(
            hotplug_error_path(domid, devid),
            "/libxl/3/colo_agent/7/hotplug-error"
        );
    }
}
