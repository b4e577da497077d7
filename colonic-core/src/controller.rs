// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! COLO NIC lifecycle controller.
//!
//! Brings the network agent up or down for one NIC around a checkpoint
//! cycle. Each call drives its own [`NicStateMachine`] and suspends only
//! while the agent script runs; the returned future resolves exactly once
//! with the operation's [`Outcome`].
//!
//! Callers must not tear a device down before its setup has resolved.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::builder::{InvocationBuilder, HOTPLUG_TIMEOUT_MS};
use crate::device::{CheckpointDevice, NicDevice};
use crate::error::{DeviceFailure, Outcome};
use crate::exec::{Executor, ExitStatus, Invocation};
use crate::resolver::resolve_interface_name;
use crate::state::{NicState, NicStateMachine};
use crate::store::Store;
use crate::types::{DeviceId, DomainId, InterfaceName, Mode, Operation, ScriptPath};
use crate::verifier::verify_setup;

/// Everything a controller needs from its surroundings for one domain.
pub struct CheckpointContext {
    domid: DomainId,
    store: Arc<dyn Store>,
    executor: Arc<dyn Executor>,
    hotplug_timeout: Duration,
}

impl CheckpointContext {
    pub fn new(domid: DomainId, store: Arc<dyn Store>, executor: Arc<dyn Executor>) -> Self {
        Self {
            domid,
            store,
            executor,
            hotplug_timeout: Duration::from_millis(HOTPLUG_TIMEOUT_MS),
        }
    }

    pub fn with_hotplug_timeout(mut self, timeout: Duration) -> Self {
        self.hotplug_timeout = timeout;
        self
    }

    pub fn domid(&self) -> DomainId {
        self.domid
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn hotplug_timeout(&self) -> Duration {
        self.hotplug_timeout
    }
}

impl fmt::Debug for CheckpointContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckpointContext")
            .field("domid", &self.domid)
            .field("hotplug_timeout", &self.hotplug_timeout)
            .finish_non_exhaustive()
    }
}

/// Drives agent setup and teardown for NIC devices of one domain.
#[derive(Debug, Clone)]
pub struct ColoNicController {
    ctx: Arc<CheckpointContext>,
}

impl ColoNicController {
    pub fn new(ctx: Arc<CheckpointContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &CheckpointContext {
        &self.ctx
    }

    /// Bring the agent up for `device`.
    ///
    /// The device is marked matched before anything is validated, so a
    /// device that fails validation still belongs to this handler.
    pub async fn setup(
        &self,
        device: &mut CheckpointDevice,
        mode: Mode,
        script: &ScriptPath,
    ) -> Outcome {
        device.matched = true;

        let mut machine = NicStateMachine::new(device.devid(), Operation::Setup);
        let result = self.run_setup(&mut machine, device, mode, script).await;
        self.finish(&mut machine, mode, result)
    }

    /// Bring the agent down for `device`. The store is never read: the
    /// interface name comes from setup, or else from the nictype default, and
    /// the outcome follows the exit status alone.
    pub async fn teardown(
        &self,
        device: &mut CheckpointDevice,
        mode: Mode,
        script: &ScriptPath,
    ) -> Outcome {
        let mut machine = NicStateMachine::new(device.devid(), Operation::Teardown);
        let result = self.run_teardown(&mut machine, device, mode, script).await;
        self.finish(&mut machine, mode, result)
    }

    async fn run_setup(
        &self,
        machine: &mut NicStateMachine,
        device: &mut CheckpointDevice,
        mode: Mode,
        script: &ScriptPath,
    ) -> Outcome {
        let devid = device.devid();

        machine.transition_to(NicState::Resolving)?;
        if device
            .backend()
            .forwarddev
            .as_deref()
            .map_or(true, str::is_empty)
        {
            return Err(DeviceFailure::Validation {
                devid,
                field: "forwarddev",
            });
        }
        let resolved = self.resolve(device)?;
        device.interface = resolved.clone();

        machine.transition_to(NicState::Building)?;
        let vif = resolved.ok_or(DeviceFailure::Validation {
            devid,
            field: "vifname",
        })?;
        let nic = NicDevice::from_backend(device.backend(), Some(vif.clone()));
        let invocation = self.builder(script).build(&nic, mode, Operation::Setup)?;

        let status = self.invoke(machine, devid, &invocation).await?;

        machine.transition_to(NicState::Verifying)?;
        verify_setup(
            self.ctx.store(),
            self.ctx.domid,
            devid,
            &vif,
            invocation.what(),
            status,
        )
    }

    async fn run_teardown(
        &self,
        machine: &mut NicStateMachine,
        device: &mut CheckpointDevice,
        mode: Mode,
        script: &ScriptPath,
    ) -> Outcome {
        let devid = device.devid();

        machine.transition_to(NicState::Building)?;
        let vif = device.interface.clone().or_else(|| {
            device
                .backend()
                .nictype
                .default_interface_name(self.ctx.domid, devid)
                .and_then(|name| InterfaceName::new(name).ok())
        });
        let nic = NicDevice::from_backend(device.backend(), vif);
        let invocation = self.builder(script).build(&nic, mode, Operation::Teardown)?;

        let status = self.invoke(machine, devid, &invocation).await?;

        if !status.is_success() {
            return Err(DeviceFailure::ProcessExit {
                devid,
                what: invocation.what().to_string(),
                status,
            });
        }
        Ok(())
    }

    /// Look up the recorded interface name of a device set up by another
    /// process, so its teardown targets the same interface. A store failure
    /// is logged and leaves the name unset.
    pub fn recall_interface(&self, device: &mut CheckpointDevice) {
        if device.interface.is_some() {
            return;
        }

        match self.resolve(device) {
            Ok(name) => device.interface = name,
            Err(e) => tracing::warn!(
                domid = %self.ctx.domid,
                devid = %device.devid(),
                error = %e,
                "Could not recall interface name"
            ),
        }
    }

    fn resolve(&self, device: &CheckpointDevice) -> Result<Option<InterfaceName>, DeviceFailure> {
        resolve_interface_name(
            self.ctx.store(),
            self.ctx.domid,
            device.devid(),
            device.backend().nictype,
        )
        .map_err(|source| DeviceFailure::StoreRead {
            devid: device.devid(),
            source,
        })
    }

    fn builder(&self, script: &ScriptPath) -> InvocationBuilder {
        InvocationBuilder::new(self.ctx.domid, script.clone(), self.ctx.hotplug_timeout)
    }

    /// Start the agent and suspend until it reports.
    async fn invoke(
        &self,
        machine: &mut NicStateMachine,
        devid: DeviceId,
        invocation: &Invocation,
    ) -> Result<ExitStatus, DeviceFailure> {
        machine.transition_to(NicState::Invoking)?;

        let completion =
            self.ctx
                .executor
                .start(invocation)
                .map_err(|source| DeviceFailure::StartRejected {
                    devid,
                    what: invocation.what().to_string(),
                    source,
                })?;

        Ok(completion.wait().await)
    }

    fn finish(&self, machine: &mut NicStateMachine, mode: Mode, result: Outcome) -> Outcome {
        let outcome = machine.complete(result);
        let elapsed_ms = machine.elapsed().as_millis() as u64;

        match &outcome {
            Ok(()) => tracing::info!(
                domid = %self.ctx.domid,
                devid = %machine.devid(),
                op = %machine.operation(),
                mode = %mode,
                elapsed_ms = elapsed_ms,
                "COLO NIC operation completed"
            ),
            Err(e) => tracing::warn!(
                domid = %self.ctx.domid,
                devid = %machine.devid(),
                op = %machine.operation(),
                mode = %mode,
                elapsed_ms = elapsed_ms,
                cause = e.cause(),
                error = %e,
                "COLO NIC operation failed"
            ),
        }

        outcome
    }
}
