// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Agent process execution on the tokio runtime.
//!
//! Spawns the agent script and supervises it from a background task that
//! reports the exit status, killing the script if it outlives its timeout.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tokio::runtime::Handle;

use super::{Completion, CompletionSender, Executor, ExitStatus, Invocation};
use crate::error::ExecError;

/// Executor backed by `tokio::process`.
///
/// Must be used from within a tokio runtime; `start` rejects the invocation
/// otherwise.
#[derive(Debug, Clone, Default)]
pub struct TokioExecutor;

impl TokioExecutor {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &Invocation) -> Command {
        let mut command = Command::new(invocation.program());
        command
            .args(invocation.argv().iter().skip(1))
            .envs(invocation.env().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl Executor for TokioExecutor {
    fn start(&self, invocation: &Invocation) -> Result<Completion, ExecError> {
        let what = invocation.what().to_string();

        let handle = Handle::try_current().map_err(|_| ExecError::NoRuntime { what: what.clone() })?;

        let child = Self::command(invocation)
            .spawn()
            .map_err(|e| ExecError::SpawnFailed {
                what: what.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            what = %what,
            pid = child.id(),
            timeout_ms = invocation.timeout().as_millis() as u64,
            "Spawned agent script"
        );

        let (tx, completion) = Completion::channel();
        handle.spawn(supervise(child, what, invocation.timeout(), tx));

        Ok(completion)
    }
}

/// Wait for the child, enforcing the timeout, and report exactly once.
async fn supervise(
    mut child: Child,
    what: String,
    timeout: std::time::Duration,
    tx: CompletionSender,
) {
    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => ExitStatus::from(status),
        Ok(Err(e)) => {
            tracing::warn!(what = %what, error = %e, "Failed to wait for agent script");
            ExitStatus::Lost
        }
        Err(_) => {
            tracing::error!(
                what = %what,
                timeout_ms = timeout.as_millis() as u64,
                "Killing agent script because of timeout"
            );
            if let Err(e) = child.kill().await {
                tracing::warn!(what = %what, error = %e, "Failed to kill agent script");
            }
            ExitStatus::TimedOut
        }
    };

    tracing::debug!(what = %what, status = %status, "Agent script finished");
    tx.complete(status);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::types::{Operation, ScriptPath};

    fn invocation(script: &str, timeout: Duration) -> Invocation {
        Invocation::new(
            ScriptPath::new(script),
            Operation::Setup,
            vec![("mode".to_string(), "primary".to_string())],
            timeout,
        )
    }

    #[tokio::test]
    async fn test_true_succeeds() {
        let completion = TokioExecutor::new()
            .start(&invocation("/bin/true", Duration::from_secs(5)))
            .unwrap();
        assert_eq!(completion.wait().await, ExitStatus::Exited(0));
    }

    #[tokio::test]
    async fn test_false_fails() {
        let completion = TokioExecutor::new()
            .start(&invocation("/bin/false", Duration::from_secs(5)))
            .unwrap();
        assert_eq!(completion.wait().await, ExitStatus::Exited(1));
    }

    #[tokio::test]
    async fn test_missing_program_is_rejected() {
        let result = TokioExecutor::new().start(&invocation(
            "/nonexistent/colo-agent",
            Duration::from_secs(5),
        ));
        assert!(matches!(result, Err(ExecError::SpawnFailed { .. })));
    }

    #[test]
    fn test_no_runtime_is_rejected() {
        let result = TokioExecutor::new().start(&invocation("/bin/true", Duration::from_secs(5)));
        assert!(matches!(result, Err(ExecError::NoRuntime { .. })));
    }
}
