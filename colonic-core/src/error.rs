// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for colonic.
//!
//! This module defines explicit enum error types as per coding guidelines.
//! No `Box<dyn Error>`, no `anyhow::Result` - all errors are strongly typed.

use std::path::PathBuf;

use thiserror::Error;

use crate::device::DeviceKind;
use crate::exec::ExitStatus;
use crate::types::{DeviceId, Operation};

/// Errors that stop the tool before any device is touched.
///
/// Per-device failures are reported as [`DeviceFailure`] outcomes instead.
#[derive(Debug, Error)]
pub enum ColoError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors reject a configuration before any device is touched.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Agent script does not exist: {path}")]
    ScriptNotFound { path: PathBuf },

    #[error("Agent script is not executable: {path}")]
    ScriptNotExecutable { path: PathBuf },

    #[error("Duplicate device ID: {devid}")]
    DuplicateDeviceId { devid: DeviceId },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// State transition errors for the per-device lifecycle.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to} for device {devid}")]
    InvalidTransition {
        devid: DeviceId,
        from: &'static str,
        to: &'static str,
    },

    #[error("Device {devid} is in terminal state: {state}")]
    TerminalState {
        devid: DeviceId,
        state: &'static str,
    },
}

/// Shared store read failures. A missing key is not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unreachable while reading {path}: {reason}")]
    Unreachable { path: String, reason: String },

    #[error("Malformed store entry at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Process executor failures reported at start time.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to spawn {what}: {reason}")]
    SpawnFailed { what: String, reason: String },

    #[error("No async runtime available to supervise {what}")]
    NoRuntime { what: String },
}

/// Why a single device setup or teardown failed.
///
/// Every variant is terminal for the operation; nothing is retried.
#[derive(Debug, Error)]
pub enum DeviceFailure {
    #[error("Device {devid}: missing {field}")]
    Validation { devid: DeviceId, field: &'static str },

    #[error("Device {devid}: could not start {what}: {source}")]
    StartRejected {
        devid: DeviceId,
        what: String,
        #[source]
        source: ExecError,
    },

    #[error("Device {devid}: {what} {status}")]
    ProcessExit {
        devid: DeviceId,
        what: String,
        status: ExitStatus,
    },

    #[error("Device {devid}: {source}")]
    StoreRead {
        devid: DeviceId,
        #[source]
        source: StoreError,
    },

    #[error("Device {devid}: {what} failed for vif {vif}: {message}")]
    InfrastructureReported {
        devid: DeviceId,
        what: String,
        vif: String,
        message: String,
    },

    #[error("No checkpoint handler matched {kind} device {devid}")]
    Unhandled { devid: DeviceId, kind: DeviceKind },

    #[error("Device {devid}: {op} task was cancelled before reporting")]
    Cancelled { devid: DeviceId, op: Operation },

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] StateTransitionError),
}

impl DeviceFailure {
    /// Short machine-readable cause name.
    pub const fn cause(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::StartRejected { .. } => "start-rejected",
            Self::ProcessExit { .. } => "process-exit",
            Self::StoreRead { .. } => "store-read",
            Self::InfrastructureReported { .. } => "infrastructure-reported",
            Self::Unhandled { .. } => "unhandled",
            Self::Cancelled { .. } => "cancelled",
            Self::Lifecycle(_) => "lifecycle",
        }
    }
}

/// Result of one device setup or teardown.
pub type Outcome = Result<(), DeviceFailure>;

/// Result type alias using ColoError.
pub type ColoResult<T> = Result<T, ColoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_validation_error_display() {
        let err = HardValidationError::MissingRequiredField {
            field: "script",
            context: "agent section".to_string(),
        };
        assert!(err.to_string().contains("script"));
        assert!(err.to_string().contains("agent section"));
    }

    #[test]
    fn test_error_chain() {
        let validation_err = HardValidationError::DuplicateDeviceId {
            devid: DeviceId::new(2),
        };
        let colo_err: ColoError = validation_err.into();
        assert!(matches!(colo_err, ColoError::HardValidation(_)));
    }

    #[test]
    fn test_infrastructure_failure_carries_message() {
        let err = DeviceFailure::InfrastructureReported {
            devid: DeviceId::new(7),
            what: "/agents/colo.sh setup".to_string(),
            vif: "vif3.7".to_string(),
            message: "link down".to_string(),
        };
        assert_eq!(err.cause(), "infrastructure-reported");
        assert!(err.to_string().contains("link down"));
        assert!(err.to_string().contains("vif3.7"));
    }

    #[test]
    fn test_process_exit_display() {
        let err = DeviceFailure::ProcessExit {
            devid: DeviceId::new(1),
            what: "/agents/colo.sh teardown".to_string(),
            status: ExitStatus::Exited(2),
        };
        assert_eq!(err.to_string(), "Device 1: /agents/colo.sh teardown exited with status 2");
    }
}
