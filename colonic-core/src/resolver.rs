// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Host interface name resolution for NIC backends.
//!
//! An explicitly assigned `vifname` in the backend directory wins over the
//! `vif<domid>.<devid>` default. The override is trusted as-is, which is only
//! sound while the backend lives in the control domain; a driver domain
//! could otherwise point the agent at an arbitrary host interface.

use crate::error::StoreError;
use crate::paths;
use crate::store::Store;
use crate::types::{DeviceId, DomainId, InterfaceName, NicType};

/// Resolve the interface name the agent script should operate on.
///
/// Returns `Ok(None)` when no usable name exists: the override is set but
/// empty, or there is no default for `nictype`.
pub fn resolve_interface_name(
    store: &dyn Store,
    domid: DomainId,
    devid: DeviceId,
    nictype: NicType,
) -> Result<Option<InterfaceName>, StoreError> {
    let path = paths::vifname_path(domid, devid);

    let name = match store.read(&path)? {
        Some(explicit) => {
            tracing::debug!(path = %path, vif = %explicit, "Using recorded interface name");
            Some(explicit)
        }
        None => nictype.default_interface_name(domid, devid),
    };

    Ok(name.and_then(|n| InterfaceName::new(n).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ids() -> (DomainId, DeviceId) {
        (DomainId::new(3).unwrap(), DeviceId::new(7))
    }

    #[test]
    fn test_recorded_name_preferred() {
        let (domid, devid) = ids();
        let store = MemoryStore::new();
        store.put(paths::vifname_path(domid, devid), "colo-eth7");

        let name = resolve_interface_name(&store, domid, devid, NicType::Vif).unwrap();
        assert_eq!(name.unwrap().as_str(), "colo-eth7");
    }

    #[test]
    fn test_fallback_to_default_name() {
        let (domid, devid) = ids();
        let store = MemoryStore::new();

        let name = resolve_interface_name(&store, domid, devid, NicType::Vif).unwrap();
        assert_eq!(name.unwrap().as_str(), "vif3.7");

        let name = resolve_interface_name(&store, domid, devid, NicType::VifIoemu).unwrap();
        assert_eq!(name.unwrap().as_str(), "vif3.7-emu");
    }

    #[test]
    fn test_no_name_available() {
        let (domid, devid) = ids();
        let store = MemoryStore::new();
        assert_eq!(
            resolve_interface_name(&store, domid, devid, NicType::Unknown).unwrap(),
            None
        );

        store.put(paths::vifname_path(domid, devid), "");
        assert_eq!(
            resolve_interface_name(&store, domid, devid, NicType::Vif).unwrap(),
            None
        );
    }

    #[test]
    fn test_store_failure_propagates() {
        let (domid, devid) = ids();
        let store = MemoryStore::new();
        store.set_unreachable(true);
        assert!(resolve_interface_name(&store, domid, devid, NicType::Vif).is_err());
    }
}
