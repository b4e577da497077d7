// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Setup verdict from exit status and the hotplug status record.
//!
//! The hotplug infrastructure can report a failure under the agent
//! directory even when the script itself exits cleanly, so the status
//! record is checked first.

use crate::error::{DeviceFailure, Outcome};
use crate::exec::ExitStatus;
use crate::paths;
use crate::store::Store;
use crate::types::{DeviceId, DomainId, InterfaceName};

/// Combine the status record and the exit status of a setup run.
pub fn verify_setup(
    store: &dyn Store,
    domid: DomainId,
    devid: DeviceId,
    vif: &InterfaceName,
    what: &str,
    status: ExitStatus,
) -> Outcome {
    let path = paths::hotplug_error_path(domid, devid);

    let hotplug_error = store
        .read(&path)
        .map_err(|source| DeviceFailure::StoreRead { devid, source })?;

    if let Some(message) = hotplug_error {
        tracing::error!(
            what = %what,
            vif = %vif,
            error = %message,
            "colo_agent script setup failed"
        );
        return Err(DeviceFailure::InfrastructureReported {
            devid,
            what: what.to_string(),
            vif: vif.to_string(),
            message,
        });
    }

    if !status.is_success() {
        return Err(DeviceFailure::ProcessExit {
            devid,
            what: what.to_string(),
            status,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const WHAT: &str = "/agents/colo.sh setup";

    fn ids() -> (DomainId, DeviceId, InterfaceName) {
        (
            DomainId::new(3).unwrap(),
            DeviceId::new(7),
            InterfaceName::new("vif3.7").unwrap(),
        )
    }

    #[test]
    fn test_clean_exit_no_record() {
        let (domid, devid, vif) = ids();
        let store = MemoryStore::new();
        assert!(verify_setup(&store, domid, devid, &vif, WHAT, ExitStatus::Exited(0)).is_ok());
    }

    #[test]
    fn test_record_beats_clean_exit() {
        let (domid, devid, vif) = ids();
        let store = MemoryStore::new();
        store.put(paths::hotplug_error_path(domid, devid), "link down");

        let err = verify_setup(&store, domid, devid, &vif, WHAT, ExitStatus::Exited(0)).unwrap_err();
        match err {
            DeviceFailure::InfrastructureReported { message, vif, .. } => {
                assert_eq!(message, "link down");
                assert_eq!(vif, "vif3.7");
            }
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[test]
    fn test_record_beats_failed_exit() {
        let (domid, devid, vif) = ids();
        let store = MemoryStore::new();
        store.put(paths::hotplug_error_path(domid, devid), "no bridge");

        let err = verify_setup(&store, domid, devid, &vif, WHAT, ExitStatus::Exited(1)).unwrap_err();
        assert_eq!(err.cause(), "infrastructure-reported");
    }

    #[test]
    fn test_failed_exit_no_record() {
        let (domid, devid, vif) = ids();
        let store = MemoryStore::new();

        for status in [ExitStatus::Exited(1), ExitStatus::Signaled(9), ExitStatus::TimedOut] {
            let err = verify_setup(&store, domid, devid, &vif, WHAT, status).unwrap_err();
            assert!(matches!(err, DeviceFailure::ProcessExit { status: s, .. } if s == status));
        }
    }

    #[test]
    fn test_store_failure_beats_everything() {
        let (domid, devid, vif) = ids();
        let store = MemoryStore::new();
        store.put(paths::hotplug_error_path(domid, devid), "link down");
        store.set_unreachable(true);

        let err = verify_setup(&store, domid, devid, &vif, WHAT, ExitStatus::Exited(0)).unwrap_err();
        assert_eq!(err.cause(), "store-read");
    }
}
