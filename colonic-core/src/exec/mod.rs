//! Agent script execution.
//!
//! The controller hands a fully built [`Invocation`] to an [`Executor`] and
//! gets back a [`Completion`] that resolves exactly once with the script's
//! [`ExitStatus`]. The executor owns the timeout.

mod invocation;
mod process;
mod scripted;

use std::fmt;

use nix::sys::signal::Signal;
use serde::Serialize;
use tokio::sync::oneshot;

pub use invocation::Invocation;
pub use process::TokioExecutor;
pub use scripted::{ScriptedExecutor, ScriptedReply};

use crate::error::ExecError;

/// How an agent invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum ExitStatus {
    /// Process exited with this code.
    Exited(i32),
    /// Process was terminated by this signal.
    Signaled(i32),
    /// Process outlived its timeout and was killed.
    TimedOut,
    /// The executor dropped the invocation without reporting.
    Lost,
}

impl ExitStatus {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {}", code),
            Self::Signaled(signo) => match Signal::try_from(*signo) {
                Ok(signal) => write!(f, "died due to fatal signal {}", signal.as_str()),
                Err(_) => write!(f, "died due to fatal signal {}", signo),
            },
            Self::TimedOut => f.write_str("timed out"),
            Self::Lost => f.write_str("exited without reporting a status"),
        }
    }
}

#[cfg(unix)]
impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match (status.code(), status.signal()) {
            (Some(code), _) => Self::Exited(code),
            (None, Some(signo)) => Self::Signaled(signo),
            (None, None) => Self::Lost,
        }
    }
}

/// Receiving half of a one-shot completion.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<ExitStatus>,
}

/// Sending half of a one-shot completion. Consumed on delivery, so a status
/// can be reported at most once.
#[derive(Debug)]
pub struct CompletionSender {
    tx: oneshot::Sender<ExitStatus>,
}

impl Completion {
    pub fn channel() -> (CompletionSender, Completion) {
        let (tx, rx) = oneshot::channel();
        (CompletionSender { tx }, Completion { rx })
    }

    /// Wait for the exit status. A sender dropped without reporting yields
    /// [`ExitStatus::Lost`].
    pub async fn wait(self) -> ExitStatus {
        self.rx.await.unwrap_or(ExitStatus::Lost)
    }
}

impl CompletionSender {
    pub fn complete(self, status: ExitStatus) {
        if self.tx.send(status).is_err() {
            tracing::debug!(status = %status, "Completion receiver already gone");
        }
    }
}

/// Asynchronous process executor contract.
///
/// `start` either rejects the invocation immediately or accepts it and
/// returns a [`Completion`] that resolves no later than
/// [`Invocation::timeout`] after the call.
pub trait Executor: Send + Sync {
    fn start(&self, invocation: &Invocation) -> Result<Completion, ExecError>;
}
