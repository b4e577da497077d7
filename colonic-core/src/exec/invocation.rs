//! Fully resolved agent command.

use std::path::Path;
use std::time::Duration;

use crate::types::{Operation, ScriptPath};

/// Immutable description of one agent script run.
///
/// `argv[0]` is the script itself and `argv[1]` the operation name. The
/// script's standard streams are always connected to `/dev/null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    script: ScriptPath,
    operation: Operation,
    argv: Vec<String>,
    env: Vec<(String, String)>,
    timeout: Duration,
    what: String,
}

impl Invocation {
    pub(crate) fn new(
        script: ScriptPath,
        operation: Operation,
        env: Vec<(String, String)>,
        timeout: Duration,
    ) -> Self {
        let argv = vec![script.to_string(), operation.as_str().to_string()];
        let what = argv.join(" ");
        Self {
            script,
            operation,
            argv,
            env,
            timeout,
            what,
        }
    }

    /// Executable to launch.
    pub fn program(&self) -> &Path {
        self.script.as_path()
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Look up one environment entry.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Human-readable label, `"<script> <operation>"`.
    pub fn what(&self) -> &str {
        &self.what
    }
}
