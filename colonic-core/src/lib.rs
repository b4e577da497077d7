//! colonic Core Library
//!
//! Lifecycle controller for COLO network agents. Brings the failover agent
//! up and down for each virtual NIC around a checkpoint cycle, on either the
//! primary or the secondary side of a replicated VM pair, and turns the
//! agent's exit status and the hotplug status record into one outcome per
//! device.

pub mod builder;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod exec;
pub mod mode;
pub mod orchestrator;
pub mod paths;
pub mod resolver;
pub mod state;
pub mod store;
pub mod types;
pub mod verifier;

// Re-export commonly used types
pub use builder::{InvocationBuilder, HOTPLUG_TIMEOUT_MS};
pub use config::{Config, ConfigLoader};
pub use controller::{CheckpointContext, ColoNicController};
pub use device::{CheckpointDevice, DeviceKind, NicBackend, NicDevice};
pub use error::{ColoError, ColoResult, DeviceFailure, HardValidationError, Outcome};
pub use exec::{Executor, ExitStatus, Invocation, ScriptedExecutor, TokioExecutor};
pub use mode::{ColoRestoreContext, ColoSaveContext, DeviceOps, Side};
pub use orchestrator::{CheckpointDevices, DeviceReport};
pub use resolver::resolve_interface_name;
pub use state::{NicState, NicStateMachine};
pub use store::{DirStore, MemoryStore, Store};
pub use types::{DeviceId, DomainId, InterfaceName, Mode, NicType, Operation, ScriptPath};
pub use verifier::verify_setup;
