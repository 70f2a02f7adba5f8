//! Action references and the action registry.
//!
//! An `onEntry`/`onExit` field names one action or a sequence of them.
//! Each element is either a registry name, resolved when the phase runs,
//! or an inline callable.

use crate::engine::error::MachineError;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callable invoked for an entry or exit phase with the event data.
pub type Action = Arc<dyn Fn(&Value) -> Result<(), MachineError> + Send + Sync>;

/// One element of an action list.
#[derive(Clone)]
pub enum ActionRef {
    /// Looked up in the machine's [`ActionRegistry`] at invocation time.
    Named(String),
    Inline(Action),
}

impl ActionRef {
    /// Wrap a closure as an inline action.
    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), MachineError> + Send + Sync + 'static,
    {
        Self::Inline(Arc::new(f))
    }

    /// Registry name, or `None` for an inline action.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Inline(_) => None,
        }
    }
}

impl fmt::Debug for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

impl From<&str> for ActionRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ActionRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// The value of an `onEntry` or `onExit` field.
#[derive(Clone, Debug)]
pub enum Actions {
    One(ActionRef),
    Many(Vec<ActionRef>),
}

impl Actions {
    /// A single inline action.
    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), MachineError> + Send + Sync + 'static,
    {
        Self::One(ActionRef::inline(f))
    }

    /// Several references, run in order.
    pub fn many<I, A>(refs: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ActionRef>,
    {
        Self::Many(refs.into_iter().map(Into::into).collect())
    }

    /// References in declared order.
    pub fn refs(&self) -> &[ActionRef] {
        match self {
            Self::One(action) => std::slice::from_ref(action),
            Self::Many(actions) => actions,
        }
    }
}

impl From<&str> for Actions {
    fn from(name: &str) -> Self {
        Self::One(name.into())
    }
}

impl From<String> for Actions {
    fn from(name: String) -> Self {
        Self::One(name.into())
    }
}

impl From<ActionRef> for Actions {
    fn from(action: ActionRef) -> Self {
        Self::One(action)
    }
}

impl From<Vec<ActionRef>> for Actions {
    fn from(actions: Vec<ActionRef>) -> Self {
        Self::Many(actions)
    }
}

impl From<Vec<&str>> for Actions {
    fn from(names: Vec<&str>) -> Self {
        Self::many(names)
    }
}

// A string is one reference; an array keeps its strings and skips every
// other element.
impl<'de> Deserialize<'de> for Actions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(name) => Ok(Self::One(ActionRef::Named(name))),
            Value::Array(items) => Ok(Self::Many(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(name) => Some(ActionRef::Named(name)),
                        _ => None,
                    })
                    .collect(),
            )),
            other => Err(de::Error::custom(format!(
                "expected an action name or a list of action names, found {other}"
            ))),
        }
    }
}

/// Named actions available to a machine.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Action>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`, replacing any previous action with that name.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value) -> Result<(), MachineError> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(f));
    }

    /// Register an already shared action under `name`.
    pub fn insert(&mut self, name: impl Into<String>, action: Action) {
        self.actions.insert(name.into(), action);
    }

    /// Remove the action registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Action> {
        self.actions.remove(name)
    }

    /// Handle to the action registered under `name`.
    pub fn get(&self, name: &str) -> Option<Action> {
        self.actions.get(name).cloned()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ActionRegistry")
            .field("actions", &names)
            .finish()
    }
}
