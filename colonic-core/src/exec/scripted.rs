//! Executor that never launches anything.
//!
//! Records every invocation it is handed and answers with a preconfigured
//! reply per operation. Used by the test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Completion, Executor, ExitStatus, Invocation};
use crate::error::ExecError;
use crate::types::Operation;

/// Canned answer for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Accept and complete with this status.
    Exit(ExitStatus),
    /// Refuse to start with this reason.
    Reject(String),
}

#[derive(Debug)]
pub struct ScriptedExecutor {
    default_reply: ScriptedReply,
    replies: Mutex<HashMap<Operation, ScriptedReply>>,
    started: Mutex<Vec<Invocation>>,
}

impl ScriptedExecutor {
    /// Executor answering every operation with `reply`.
    pub fn new(reply: ScriptedReply) -> Self {
        Self {
            default_reply: reply,
            replies: Mutex::new(HashMap::new()),
            started: Mutex::new(Vec::new()),
        }
    }

    /// Executor whose scripts all exit with this status.
    pub fn exiting(status: ExitStatus) -> Self {
        Self::new(ScriptedReply::Exit(status))
    }

    /// Override the reply for one operation.
    pub fn reply_to(&self, operation: Operation, reply: ScriptedReply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(operation, reply);
    }

    /// Every invocation accepted or rejected so far, in call order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.started
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn start_count(&self) -> usize {
        self.started.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Executor for ScriptedExecutor {
    fn start(&self, invocation: &Invocation) -> Result<Completion, ExecError> {
        self.started
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(invocation.clone());

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&invocation.operation())
            .cloned()
            .unwrap_or_else(|| self.default_reply.clone());

        match reply {
            ScriptedReply::Exit(status) => {
                let (tx, completion) = Completion::channel();
                tx.complete(status);
                Ok(completion)
            }
            ScriptedReply::Reject(reason) => Err(ExecError::SpawnFailed {
                what: invocation.what().to_string(),
                reason,
            }),
        }
    }
}
