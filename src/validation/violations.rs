//! Individual configuration problems.

use crate::builder::Phase;
use thiserror::Error;

/// A single problem found while validating a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("Initial state '{initial}' is not defined")]
    UnknownInitialState { initial: String },

    #[error("Event '{event}' in state '{state}' targets undefined state '{target}'")]
    UnknownTarget {
        state: String,
        event: String,
        target: String,
    },

    #[error("Action '{action}' in {phase} of state '{state}' is not registered")]
    UnknownAction {
        state: String,
        phase: Phase,
        action: String,
    },

    #[error("Event '{event}' in state '{state}' declares both a target and a service")]
    AmbiguousTransition { state: String, event: String },

    #[error("State '{state}' is defined more than once")]
    DuplicateState { state: String },

    #[error("Service for event '{event}' attached to undefined state '{state}'")]
    ServiceForUnknownState { state: String, event: String },

    #[error("Context must be an object, found {found}")]
    ContextNotObject { found: String },
}
