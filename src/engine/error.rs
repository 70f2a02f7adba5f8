//! Runtime errors raised by machines, the execution stack, and hooks.

use thiserror::Error;

/// Errors that can occur while a machine is running.
///
/// Every variant is a programmer or configuration error. The engine never
/// retries and never rolls back: actions that already ran before an error
/// keep their side effects.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MachineError {
    /// A hook accessor or stack read ran with no machine executing.
    #[error("No machine is executing on this thread")]
    EmptyStack,

    #[error("Event '{event}' is not handled in state '{state}' of machine '{machine}'")]
    UnknownEvent {
        machine: String,
        state: String,
        event: String,
    },

    #[error("Transition for event '{event}' in state '{state}' of machine '{machine}' has neither target nor service")]
    MissingTarget {
        machine: String,
        state: String,
        event: String,
    },

    #[error("State '{state}' does not exist in machine '{machine}'")]
    UnknownState { machine: String, state: String },

    #[error("Action '{action}' is not registered in machine '{machine}'")]
    UnknownAction { machine: String, action: String },

    /// Context patches must be JSON objects (or null).
    #[error("Context patch for machine '{machine}' must be an object, found {found}")]
    InvalidContextPatch { machine: String, found: String },

    #[error("Event '{event}' in state '{state}' of machine '{machine}' invokes an async service; use transition_async")]
    AsyncServiceInSyncTransition {
        machine: String,
        state: String,
        event: String,
    },

    /// Failure reported by a user action or service.
    #[error("Action failed: {0}")]
    ActionFailed(String),
}
