//! Builder for constructing machines.

use crate::builder::config::{MachineConfig, StateDefinition};
use crate::builder::error::BuildError;
use crate::engine::{Machine, MachineError, Service};
use crate::validation::ConfigViolation;
use serde_json::Value;
use std::collections::hash_map::Entry;

/// Builder for constructing machines with a fluent API.
///
/// Start from scratch with [`new`](Self::new) or complete a parsed
/// configuration with [`from_config`](Self::from_config). Problems are
/// collected as they are noticed and reported together by
/// [`build`](Self::build).
#[derive(Debug)]
pub struct MachineBuilder {
    id: String,
    initial: Option<String>,
    config: MachineConfig,
    recorded: Vec<ConfigViolation>,
}

impl MachineBuilder {
    /// Start an empty configuration for machines identified by `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initial: None,
            config: MachineConfig::default(),
            recorded: Vec::new(),
        }
    }

    /// Continue from an existing configuration, typically parsed from JSON.
    pub fn from_config(config: MachineConfig) -> Self {
        Self {
            id: config.id.clone(),
            initial: Some(config.initial_state.clone()),
            config,
            recorded: Vec::new(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Set the initial context; must be a JSON object.
    pub fn context(mut self, context: Value) -> Self {
        self.config.context = context;
        self
    }

    /// Keep at most `limit` state changes in the history; zero disables it.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Add a state. Adding the same name twice is a violation.
    pub fn state(mut self, name: impl Into<String>, state: impl Into<StateDefinition>) -> Self {
        match self.config.states.entry(name.into()) {
            Entry::Occupied(entry) => self.recorded.push(ConfigViolation::DuplicateState {
                state: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(state.into());
            }
        }
        self
    }

    /// Register a named action.
    pub fn action<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), MachineError> + Send + Sync + 'static,
    {
        self.config.actions.register(name, f);
        self
    }

    /// Attach `service` to `event` in an already added `state`.
    ///
    /// A target previously declared for that event is kept; validation then
    /// reports the transition as ambiguous.
    pub fn service(
        mut self,
        state: impl Into<String>,
        event: impl Into<String>,
        service: Service,
    ) -> Self {
        let state = state.into();
        let event = event.into();
        match self.config.states.get_mut(&state) {
            Some(definition) => {
                definition.on.entry(event).or_default().service = Some(service);
            }
            None => self
                .recorded
                .push(ConfigViolation::ServiceForUnknownState { state, event }),
        }
        self
    }

    /// Validate the configuration and construct the machine.
    pub fn build(self) -> Result<Machine, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        let config = MachineConfig {
            id: self.id,
            initial_state: initial,
            ..self.config
        };

        Machine::from_parts(config, &self.recorded)
    }
}
