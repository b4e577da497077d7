// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Following the "Newtype" pattern in Rust to ensure valid state by construction.
//! All types validate their invariants at creation time.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// First domain id reserved by the hypervisor for special domains.
const DOMID_FIRST_RESERVED: u32 = 0x7FF0;

/// Validated domain (VM) identifier.
/// Domain 0 is the control domain and never takes part in a checkpoint pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DomainId(u32);

impl DomainId {
    /// Create a new DomainId with validation.
    pub fn new(id: u32) -> Result<Self, HardValidationError> {
        if id == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "domain_id",
                value: id.to_string(),
                reason: "Domain 0 is the control domain".to_string(),
            });
        }

        if id >= DOMID_FIRST_RESERVED {
            return Err(HardValidationError::InvalidFieldValue {
                field: "domain_id",
                value: id.to_string(),
                reason: format!("Domain IDs from {:#x} upwards are reserved", DOMID_FIRST_RESERVED),
            });
        }

        Ok(Self(id))
    }

    /// Get the inner value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for DomainId {
    type Error = HardValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DomainId> for u32 {
    fn from(id: DomainId) -> Self {
        id.0
    }
}

/// Device identifier, unique among the devices of one kind within a VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct DeviceId(u32);

impl DeviceId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DeviceId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<DeviceId> for u32 {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

/// Host-side network interface name handed to the agent script.
/// Must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Create a new InterfaceName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "vifname",
                value: name,
                reason: "Interface name cannot be empty".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InterfaceName> for String {
    fn from(name: InterfaceName) -> Self {
        name.0
    }
}

/// Path of an agent script.
///
/// Nothing is checked on construction; the script is only looked at when it
/// is launched, or on demand with [`ScriptPath::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPath(PathBuf);

impl ScriptPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Verify the script exists and is executable.
    pub fn check(&self) -> Result<(), HardValidationError> {
        let metadata = std::fs::metadata(&self.0).map_err(|_| HardValidationError::ScriptNotFound {
            path: self.0.clone(),
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.is_dir() || metadata.permissions().mode() & 0o111 == 0 {
                return Err(HardValidationError::ScriptNotExecutable {
                    path: self.0.clone(),
                });
            }
        }
        #[cfg(not(unix))]
        let _ = metadata;

        Ok(())
    }

    /// Get the inner path.
    pub fn as_path(&self) -> &std::path::Path {
        &self.0
    }
}

impl fmt::Display for ScriptPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Side of the replicated pair this host plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Active side, source of checkpoints.
    Primary,
    /// Standby side, sink of checkpoints.
    Secondary,
}

impl Mode {
    /// Value passed to the agent in the `mode` environment variable.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent script operation, passed as its first argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Setup,
    Teardown,
}

impl Operation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend flavour of a virtual NIC. Decides the default interface name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NicType {
    /// Type not recorded; no default name can be derived.
    Unknown,
    /// Paravirtual netback interface.
    #[default]
    Vif,
    /// Paravirtual interface paired with an emulated tap device.
    VifIoemu,
}

impl NicType {
    /// Default host interface name for a device of this type.
    pub fn default_interface_name(&self, domid: DomainId, devid: DeviceId) -> Option<String> {
        match self {
            Self::Vif => Some(format!("vif{}.{}", domid, devid)),
            Self::VifIoemu => Some(format!("vif{}.{}-emu", domid, devid)),
            Self::Unknown => None,
        }
    }
}
