// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Fan-out of setup and teardown over the devices of one session.
//!
//! Each device runs on its own task with its own controller call; nothing
//! is shared between them except the read-only store. The first handler
//! whose device class matches claims the device.

use tokio::task::{JoinHandle, JoinSet};

use crate::device::CheckpointDevice;
use crate::error::{DeviceFailure, Outcome};
use crate::mode::DeviceOps;
use crate::types::Operation;

/// Result for one device of a fan-out.
#[derive(Debug)]
pub struct DeviceReport {
    pub device: CheckpointDevice,
    pub operation: Operation,
    pub outcome: Outcome,
}

/// Run setup on its own task and hand the outcome to `on_complete`.
///
/// `on_complete` is `FnOnce`, so it runs exactly once.
pub fn spawn_setup<F>(ops: DeviceOps, mut device: CheckpointDevice, on_complete: F) -> JoinHandle<()>
where
    F: FnOnce(CheckpointDevice, Outcome) + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = ops.setup(&mut device).await;
        on_complete(device, outcome);
    })
}

/// Run teardown on its own task and hand the outcome to `on_complete`.
pub fn spawn_teardown<F>(
    ops: DeviceOps,
    mut device: CheckpointDevice,
    on_complete: F,
) -> JoinHandle<()>
where
    F: FnOnce(CheckpointDevice, Outcome) + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = ops.teardown(&mut device).await;
        on_complete(device, outcome);
    })
}

/// Devices of one checkpoint session and the handlers that may claim them.
#[derive(Debug)]
pub struct CheckpointDevices {
    ops: Vec<DeviceOps>,
    devices: Vec<CheckpointDevice>,
}

impl CheckpointDevices {
    pub fn new(ops: Vec<DeviceOps>, devices: Vec<CheckpointDevice>) -> Self {
        Self { ops, devices }
    }

    pub fn devices(&self) -> &[CheckpointDevice] {
        &self.devices
    }

    /// Mark every device as claimed by a previous setup, for a teardown
    /// issued from a fresh process, and recall the interface names that
    /// setup resolved.
    pub fn claim_all(&mut self) {
        for device in &mut self.devices {
            if let Some(ops) = self.ops.iter().find(|ops| ops.handles(device)) {
                device.matched = true;
                ops.recall_interface(device);
            }
        }
    }

    /// Set up every device concurrently. Reports come back in device order.
    pub async fn setup_all(&mut self) -> Vec<DeviceReport> {
        self.run_all(Operation::Setup).await
    }

    /// Tear down every matched device concurrently. Unmatched devices are
    /// left alone and not reported.
    pub async fn teardown_all(&mut self) -> Vec<DeviceReport> {
        self.run_all(Operation::Teardown).await
    }

    async fn run_all(&mut self, operation: Operation) -> Vec<DeviceReport> {
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<DeviceReport>> = Vec::new();
        let mut spawned: Vec<Option<CheckpointDevice>> = Vec::new();
        let mut idle = Vec::new();

        for (index, mut device) in std::mem::take(&mut self.devices).into_iter().enumerate() {
            slots.push(None);
            spawned.push(None);

            if operation == Operation::Teardown && !device.matched {
                idle.push((index, device));
                continue;
            }

            let Some(ops) = self.ops.iter().find(|ops| ops.handles(&device)).cloned() else {
                let outcome = Err(DeviceFailure::Unhandled {
                    devid: device.devid(),
                    kind: device.kind(),
                });
                slots[index] = Some(DeviceReport {
                    device,
                    operation,
                    outcome,
                });
                continue;
            };

            spawned[index] = Some(device.clone());
            tasks.spawn(async move {
                let outcome = match operation {
                    Operation::Setup => ops.setup(&mut device).await,
                    Operation::Teardown => ops.teardown(&mut device).await,
                };
                (index, device, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, device, outcome)) => {
                    slots[index] = Some(DeviceReport {
                        device,
                        operation,
                        outcome,
                    });
                }
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => tracing::error!(error = %e, op = %operation, "Device task cancelled"),
            }
        }
        settle_unreported(&mut slots, spawned, operation);

        let mut reports = Vec::with_capacity(slots.len());
        let mut devices: Vec<Option<CheckpointDevice>> = Vec::with_capacity(slots.len());
        devices.resize_with(slots.len(), || None);
        for (index, device) in idle {
            devices[index] = Some(device);
        }
        for (index, slot) in slots.into_iter().enumerate() {
            if let Some(report) = slot {
                devices[index] = Some(report.device.clone());
                reports.push(report);
            }
        }
        self.devices = devices.into_iter().flatten().collect();

        let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
        tracing::info!(
            op = %operation,
            devices = reports.len(),
            failed = failed,
            "Checkpoint device fan-out finished"
        );

        reports
    }
}

/// Report a failure for every spawned device whose task never returned,
/// keeping the device as it was handed to the task.
fn settle_unreported(
    slots: &mut [Option<DeviceReport>],
    spawned: Vec<Option<CheckpointDevice>>,
    operation: Operation,
) {
    for (slot, device) in slots.iter_mut().zip(spawned) {
        let Some(mut device) = device else { continue };
        if slot.is_some() {
            continue;
        }

        // Setup claims its device before anything else.
        if operation == Operation::Setup {
            device.matched = true;
        }
        let outcome = Err(DeviceFailure::Cancelled {
            devid: device.devid(),
            op: operation,
        });
        *slot = Some(DeviceReport {
            device,
            operation,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::controller::{CheckpointContext, ColoNicController};
    use crate::device::{DeviceKind, NicBackend};
    use crate::exec::{ExitStatus, ScriptedExecutor, ScriptedReply};
    use crate::mode::Side;
    use crate::store::MemoryStore;
    use crate::types::{DeviceId, DomainId, Mode, NicType, ScriptPath};

    fn ops(executor: Arc<ScriptedExecutor>) -> DeviceOps {
        let ctx = CheckpointContext::new(
            DomainId::new(5).unwrap(),
            Arc::new(MemoryStore::new()),
            executor,
        );
        DeviceOps::colo_nic(
            ColoNicController::new(Arc::new(ctx)),
            Side::for_mode(Mode::Primary, ScriptPath::new("/agents/colo.sh")),
        )
    }

    fn backend(devid: u32, forwarddev: Option<&str>) -> NicBackend {
        NicBackend {
            devid: DeviceId::new(devid),
            forwarddev: forwarddev.map(str::to_string),
            nictype: NicType::Vif,
        }
    }

    #[tokio::test]
    async fn test_setup_all_reports_in_order() {
        let executor = Arc::new(ScriptedExecutor::exiting(ExitStatus::Exited(0)));
        let mut session = CheckpointDevices::new(
            vec![ops(executor.clone())],
            vec![
                CheckpointDevice::nic(backend(0, Some("eth0"))),
                CheckpointDevice::nic(backend(1, None)),
                CheckpointDevice::new(DeviceKind::Vbd, backend(2, None)),
            ],
        );

        let reports = session.setup_all().await;
        assert_eq!(reports.len(), 3);
        assert!(reports[0].outcome.is_ok());
        assert_eq!(reports[1].outcome.as_ref().unwrap_err().cause(), "validation");
        assert_eq!(reports[2].outcome.as_ref().unwrap_err().cause(), "unhandled");

        // Claimed even though validation failed; the disk was not claimed.
        let matched: Vec<bool> = session.devices().iter().map(|d| d.matched).collect();
        assert_eq!(matched, vec![true, true, false]);
        assert_eq!(executor.start_count(), 1);
    }

    #[tokio::test]
    async fn test_teardown_all_skips_unmatched() {
        let executor = Arc::new(ScriptedExecutor::exiting(ExitStatus::Exited(0)));
        executor.reply_to(Operation::Teardown, ScriptedReply::Exit(ExitStatus::Exited(1)));
        let mut session = CheckpointDevices::new(
            vec![ops(executor.clone())],
            vec![
                CheckpointDevice::nic(backend(0, Some("eth0"))),
                CheckpointDevice::new(DeviceKind::Vbd, backend(1, None)),
            ],
        );

        session.setup_all().await;
        let reports = session.teardown_all().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].device.devid(), DeviceId::new(0));
        assert_eq!(reports[0].outcome.as_ref().unwrap_err().cause(), "process-exit");
        assert_eq!(session.devices().len(), 2);
    }

    #[tokio::test]
    async fn test_claim_all_enables_teardown() {
        let executor = Arc::new(ScriptedExecutor::exiting(ExitStatus::Exited(0)));
        let mut session = CheckpointDevices::new(
            vec![ops(executor.clone())],
            vec![CheckpointDevice::nic(backend(4, Some("eth1")))],
        );

        assert!(session.teardown_all().await.is_empty());
        session.claim_all();
        let reports = session.teardown_all().await;
        assert_eq!(reports.len(), 1);
        assert!(reports[0].outcome.is_ok());
        assert_eq!(executor.invocations()[0].env_var("vifname"), Some("vif5.4"));
    }

    #[tokio::test]
    async fn test_claim_all_recalls_recorded_names() {
        let store = Arc::new(MemoryStore::new());
        store.put("/local/domain/0/backend/vif/5/4/vifname", "colo-uplink");
        let executor = Arc::new(ScriptedExecutor::exiting(ExitStatus::Exited(0)));
        let ctx = CheckpointContext::new(DomainId::new(5).unwrap(), store, executor.clone());
        let ops = DeviceOps::colo_nic(
            ColoNicController::new(Arc::new(ctx)),
            Side::for_mode(Mode::Secondary, ScriptPath::new("/agents/colo.sh")),
        );
        let mut session =
            CheckpointDevices::new(vec![ops], vec![CheckpointDevice::nic(backend(4, Some("eth1")))]);

        session.claim_all();
        let reports = session.teardown_all().await;
        assert!(reports[0].outcome.is_ok());
        assert_eq!(
            executor.invocations()[0].env_var("vifname"),
            Some("colo-uplink")
        );
    }

    #[test]
    fn test_settle_unreported_keeps_devices() {
        let finished = CheckpointDevice::nic(backend(0, Some("eth0")));
        let lost = CheckpointDevice::nic(backend(1, Some("eth1")));
        let mut slots = vec![
            Some(DeviceReport {
                device: finished.clone(),
                operation: Operation::Setup,
                outcome: Ok(()),
            }),
            None,
            None,
        ];

        settle_unreported(
            &mut slots,
            vec![Some(finished), Some(lost), None],
            Operation::Setup,
        );

        assert!(slots[0].as_ref().unwrap().outcome.is_ok());
        let report = slots[1].as_ref().unwrap();
        assert_eq!(report.device.devid(), DeviceId::new(1));
        assert!(report.device.matched);
        assert_eq!(report.outcome.as_ref().unwrap_err().cause(), "cancelled");
        assert!(slots[2].is_none());
    }

    #[tokio::test]
    async fn test_spawn_setup_continuation_runs_once() {
        let executor = Arc::new(ScriptedExecutor::exiting(ExitStatus::Exited(0)));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();

        spawn_setup(
            ops(executor),
            CheckpointDevice::nic(backend(0, Some("eth0"))),
            move |device, outcome| {
                seen.lock().unwrap().push((device.matched, outcome.is_ok()));
            },
        )
        .await
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![(true, true)]);
    }

    #[tokio::test]
    async fn test_spawn_teardown_reports_failure() {
        let executor = Arc::new(ScriptedExecutor::new(ScriptedReply::Reject(
            "exec format error".to_string(),
        )));
        let (tx, rx) = tokio::sync::oneshot::channel();

        spawn_teardown(
            ops(executor),
            CheckpointDevice::nic(backend(0, Some("eth0"))),
            move |_, outcome| {
                let _ = tx.send(outcome);
            },
        );

        let outcome = rx.await.unwrap();
        assert_eq!(outcome.unwrap_err().cause(), "start-rejected");
    }
}
