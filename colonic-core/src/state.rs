// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Per-device lifecycle state machine with typed state transitions.
//!
//! Setup: Idle → Resolving → Building → Invoking → Verifying → Completed.
//! Teardown: Idle → Building → Invoking → Completed.
//! Any non-terminal state may fail straight to Completed. Completed is
//! terminal, so an outcome can be recorded only once per operation.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Outcome, StateTransitionError};
use crate::types::{DeviceId, Operation};

/// Device operation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NicState {
    /// Nothing has happened yet.
    Idle,

    /// Looking up the interface name.
    Resolving,

    /// Validating the device and building the invocation.
    Building,

    /// Agent script started, waiting for its exit status.
    Invoking,

    /// Reading the status record after setup.
    Verifying,

    /// Outcome delivered.
    Completed,
}

impl NicState {
    /// Get the state name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Resolving => "Resolving",
            Self::Building => "Building",
            Self::Invoking => "Invoking",
            Self::Verifying => "Verifying",
            Self::Completed => "Completed",
        }
    }

    /// Check if transition to the target state is valid for `operation`.
    pub fn can_transition_to(&self, target: NicState, operation: Operation) -> bool {
        match operation {
            Operation::Setup => matches!(
                (self, target),
                (Self::Idle, Self::Resolving)
                    | (Self::Resolving, Self::Building)
                    | (Self::Building, Self::Invoking)
                    | (Self::Invoking, Self::Verifying)
                    | (Self::Idle, Self::Completed)
                    | (Self::Resolving, Self::Completed)
                    | (Self::Building, Self::Completed)
                    | (Self::Invoking, Self::Completed)
                    | (Self::Verifying, Self::Completed)
            ),
            Operation::Teardown => matches!(
                (self, target),
                (Self::Idle, Self::Building)
                    | (Self::Building, Self::Invoking)
                    | (Self::Idle, Self::Completed)
                    | (Self::Building, Self::Completed)
                    | (Self::Invoking, Self::Completed)
            ),
        }
    }
}

impl std::fmt::Display for NicState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// State machine for one setup or teardown of one device.
#[derive(Debug)]
pub struct NicStateMachine {
    devid: DeviceId,
    operation: Operation,
    current_state: NicState,
    started: Instant,
    transition_count: u64,
}

impl NicStateMachine {
    pub fn new(devid: DeviceId, operation: Operation) -> Self {
        Self {
            devid,
            operation,
            current_state: NicState::Idle,
            started: Instant::now(),
            transition_count: 0,
        }
    }

    pub fn state(&self) -> NicState {
        self.current_state
    }

    pub fn devid(&self) -> DeviceId {
        self.devid
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Time since the operation began.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: NicState) -> Result<(), StateTransitionError> {
        if self.current_state == NicState::Completed {
            return Err(StateTransitionError::TerminalState {
                devid: self.devid,
                state: self.current_state.name(),
            });
        }

        if !self.current_state.can_transition_to(target, self.operation) {
            return Err(StateTransitionError::InvalidTransition {
                devid: self.devid,
                from: self.current_state.name(),
                to: target.name(),
            });
        }

        tracing::debug!(
            devid = %self.devid,
            op = %self.operation,
            from = self.current_state.name(),
            to = target.name(),
            "State transition"
        );

        self.current_state = target;
        self.transition_count += 1;

        Ok(())
    }

    /// Move to Completed and hand back the outcome.
    ///
    /// Fails if an outcome was already delivered.
    pub fn complete(&mut self, outcome: Outcome) -> Outcome {
        self.transition_to(NicState::Completed)?;
        outcome
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.current_state, NicState::Completed)
    }
}
