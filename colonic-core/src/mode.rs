// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Primary and secondary bindings of the NIC controller.
//!
//! The primary runs the save (checkpoint source) side and the secondary the
//! restore (checkpoint sink) side. Each side carries its own agent script.

use crate::controller::ColoNicController;
use crate::device::{CheckpointDevice, DeviceKind};
use crate::error::Outcome;
use crate::types::{Mode, ScriptPath};

/// Primary-side session context.
#[derive(Debug, Clone)]
pub struct ColoSaveContext {
    pub colo_agent_script: ScriptPath,
}

/// Secondary-side session context.
#[derive(Debug, Clone)]
pub struct ColoRestoreContext {
    pub colo_agent_script: ScriptPath,
}

impl ColoNicController {
    pub async fn primary_setup(
        &self,
        device: &mut CheckpointDevice,
        css: &ColoSaveContext,
    ) -> Outcome {
        self.setup(device, Mode::Primary, &css.colo_agent_script).await
    }

    pub async fn primary_teardown(
        &self,
        device: &mut CheckpointDevice,
        css: &ColoSaveContext,
    ) -> Outcome {
        self.teardown(device, Mode::Primary, &css.colo_agent_script).await
    }

    pub async fn secondary_setup(
        &self,
        device: &mut CheckpointDevice,
        crs: &ColoRestoreContext,
    ) -> Outcome {
        self.setup(device, Mode::Secondary, &crs.colo_agent_script).await
    }

    pub async fn secondary_teardown(
        &self,
        device: &mut CheckpointDevice,
        crs: &ColoRestoreContext,
    ) -> Outcome {
        self.teardown(device, Mode::Secondary, &crs.colo_agent_script).await
    }
}

/// Which side of the pair a handler serves.
#[derive(Debug, Clone)]
pub enum Side {
    Save(ColoSaveContext),
    Restore(ColoRestoreContext),
}

impl Side {
    /// Side for `mode`, running `script`.
    pub fn for_mode(mode: Mode, script: ScriptPath) -> Self {
        match mode {
            Mode::Primary => Self::Save(ColoSaveContext {
                colo_agent_script: script,
            }),
            Mode::Secondary => Self::Restore(ColoRestoreContext {
                colo_agent_script: script,
            }),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Save(_) => Mode::Primary,
            Self::Restore(_) => Mode::Secondary,
        }
    }
}

/// Checkpoint device handlers, one variant per device class handled here.
/// Every handler offers exactly setup and teardown.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceOps {
    ColoNic {
        controller: ColoNicController,
        side: Side,
    },
}

impl DeviceOps {
    pub fn colo_nic(controller: ColoNicController, side: Side) -> Self {
        Self::ColoNic { controller, side }
    }

    /// Device class this handler claims.
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::ColoNic { .. } => DeviceKind::Vif,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::ColoNic { side, .. } => side.mode(),
        }
    }

    pub fn handles(&self, device: &CheckpointDevice) -> bool {
        self.kind() == device.kind()
    }

    /// Fill in the interface name a setup in another process resolved.
    pub fn recall_interface(&self, device: &mut CheckpointDevice) {
        match self {
            Self::ColoNic { controller, .. } => controller.recall_interface(device),
        }
    }

    pub async fn setup(&self, device: &mut CheckpointDevice) -> Outcome {
        match self {
            Self::ColoNic {
                controller,
                side: Side::Save(css),
            } => controller.primary_setup(device, css).await,
            Self::ColoNic {
                controller,
                side: Side::Restore(crs),
            } => controller.secondary_setup(device, crs).await,
        }
    }

    pub async fn teardown(&self, device: &mut CheckpointDevice) -> Outcome {
        match self {
            Self::ColoNic {
                controller,
                side: Side::Save(css),
            } => controller.primary_teardown(device, css).await,
            Self::ColoNic {
                controller,
                side: Side::Restore(crs),
            } => controller.secondary_teardown(device, crs).await,
        }
    }
}
