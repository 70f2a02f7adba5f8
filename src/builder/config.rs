//! Static machine configuration.
//!
//! The configuration is plain data: a state graph keyed by state name, an
//! initial state, an initial context and an action registry. It can be read
//! from JSON (named actions and targets only) and completed with inline
//! callables and services through [`MachineBuilder`](crate::builder::MachineBuilder).

use crate::builder::error::BuildError;
use crate::engine::{ActionRegistry, Actions, Service};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Number of state changes a machine keeps unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Which action field of a state is being run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Entry,
    Exit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => f.write_str("onEntry"),
            Self::Exit => f.write_str("onExit"),
        }
    }
}

/// What happens when an event is handled in a state.
///
/// Exactly one of `target` or `service` should be set. A definition with
/// neither is accepted at construction and fails when the event fires.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TransitionDefinition {
    #[serde(default)]
    pub target: Option<String>,

    #[serde(skip)]
    pub service: Option<Service>,
}

impl TransitionDefinition {
    /// Transition that moves the machine to `target`.
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            service: None,
        }
    }

    /// Transition handled by `service`.
    pub fn invoke(service: Service) -> Self {
        Self {
            target: None,
            service: Some(service),
        }
    }
}

/// One node of the state graph.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDefinition {
    #[serde(default)]
    pub on_entry: Option<Actions>,

    #[serde(default)]
    pub on_exit: Option<Actions>,

    #[serde(default)]
    pub on: HashMap<String, TransitionDefinition>,
}

impl StateDefinition {
    /// Actions declared for `phase`, if any.
    pub fn actions(&self, phase: Phase) -> Option<&Actions> {
        match phase {
            Phase::Entry => self.on_entry.as_ref(),
            Phase::Exit => self.on_exit.as_ref(),
        }
    }
}

/// Complete configuration consumed once when a machine is constructed.
///
/// # Example
///
/// ```rust
/// use statehook::builder::MachineConfig;
///
/// let config = MachineConfig::from_json(r#"{
///     "id": "vacancy",
///     "initialState": "draft",
///     "context": {"applicants": 0},
///     "states": {
///         "draft": {"on": {"PUBLISH": {"target": "open"}}},
///         "open": {"onEntry": ["announce"]}
///     }
/// }"#).unwrap();
///
/// assert_eq!(config.initial_state, "draft");
/// assert!(config.states["open"].on_entry.is_some());
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfig {
    pub id: String,

    pub initial_state: String,

    /// Must be a JSON object or `null`.
    #[serde(default)]
    pub context: Value,

    pub states: HashMap<String, StateDefinition>,

    /// Most recent state changes kept in the history; zero disables it.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(skip)]
    pub actions: ActionRegistry,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            initial_state: String::new(),
            context: Value::Null,
            states: HashMap::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            actions: ActionRegistry::new(),
        }
    }
}

impl MachineConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        serde_json::from_str(json).map_err(|e| BuildError::Parse(e.to_string()))
    }

    /// Parse a configuration from an already decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, BuildError> {
        serde_json::from_value(value).map_err(|e| BuildError::Parse(e.to_string()))
    }
}
