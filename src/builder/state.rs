//! Builder for a single state definition.

use crate::builder::config::{StateDefinition, TransitionDefinition};
use crate::engine::{Actions, Service};

/// Builder for one state of the graph.
#[derive(Clone, Debug, Default)]
pub struct StateBuilder {
    definition: StateDefinition,
}

impl StateBuilder {
    /// Start a state with no actions and no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry actions, replacing any previous ones.
    pub fn entry(mut self, actions: impl Into<Actions>) -> Self {
        self.definition.on_entry = Some(actions.into());
        self
    }

    /// Set the exit actions, replacing any previous ones.
    pub fn exit(mut self, actions: impl Into<Actions>) -> Self {
        self.definition.on_exit = Some(actions.into());
        self
    }

    /// Move to `target` when `event` fires.
    pub fn on(self, event: impl Into<String>, target: impl Into<String>) -> Self {
        self.transition(event, TransitionDefinition::to(target))
    }

    /// Hand `event` to `service`.
    pub fn invoke(self, event: impl Into<String>, service: Service) -> Self {
        self.transition(event, TransitionDefinition::invoke(service))
    }

    /// Handle `event` with a prepared transition definition.
    pub fn transition(mut self, event: impl Into<String>, transition: TransitionDefinition) -> Self {
        self.definition.on.insert(event.into(), transition);
        self
    }

    /// Finish the state definition.
    pub fn build(self) -> StateDefinition {
        self.definition
    }
}

impl From<StateBuilder> for StateDefinition {
    fn from(builder: StateBuilder) -> Self {
        builder.build()
    }
}
