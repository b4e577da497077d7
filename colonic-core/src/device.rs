// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Devices taking part in a checkpoint cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DeviceId, InterfaceName, NicType};

/// Device class, used to pick the handler for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Virtual network interface.
    Vif,
    /// Virtual block device.
    Vbd,
}

impl DeviceKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Vif => "vif",
            Self::Vbd => "vbd",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Backend descriptor of a NIC as known to the toolstack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicBackend {
    pub devid: DeviceId,
    /// Physical device the agent forwards replicated traffic through.
    #[serde(default)]
    pub forwarddev: Option<String>,
    #[serde(default)]
    pub nictype: NicType,
}

/// Orchestrator-side record of one device for one checkpoint session.
#[derive(Debug, Clone)]
pub struct CheckpointDevice {
    kind: DeviceKind,
    backend: NicBackend,
    /// Set once a handler has claimed the device.
    pub matched: bool,
    /// Interface name resolved during setup, reused by teardown.
    pub interface: Option<InterfaceName>,
}

impl CheckpointDevice {
    pub fn nic(backend: NicBackend) -> Self {
        Self {
            kind: DeviceKind::Vif,
            backend,
            matched: false,
            interface: None,
        }
    }

    pub fn new(kind: DeviceKind, backend: NicBackend) -> Self {
        Self {
            kind,
            backend,
            matched: false,
            interface: None,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn backend(&self) -> &NicBackend {
        &self.backend
    }

    pub fn devid(&self) -> DeviceId {
        self.backend.devid
    }
}

/// Transient view of a NIC used while building one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicDevice {
    pub devid: DeviceId,
    pub forwarddev: Option<String>,
    pub interface: Option<InterfaceName>,
}

impl NicDevice {
    pub fn from_backend(backend: &NicBackend, interface: Option<InterfaceName>) -> Self {
        Self {
            devid: backend.devid,
            forwarddev: backend.forwarddev.clone(),
            interface,
        }
    }
}
