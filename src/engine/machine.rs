//! The machine instance and its transition protocol.

use crate::builder::{BuildError, MachineConfig, Phase, StateDefinition, TransitionDefinition};
use crate::core::{json_kind, Context, StateHistory, StateTransition};
use crate::engine::action::{Action, ActionRef, ActionRegistry, Actions};
use crate::engine::error::MachineError;
use crate::engine::service::{Bracketed, Service, SyncService};
use crate::stack;
use crate::validation::{validate, ConfigViolation};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use stillwater::validation::Validation;
use uuid::Uuid;

struct Shared {
    id: String,
    instance_id: Uuid,
    initial: String,
    states: HashMap<String, StateDefinition>,
    history_limit: usize,
    actions: Mutex<ActionRegistry>,
    runtime: Mutex<Runtime>,
}

struct Runtime {
    current: String,
    context: Context,
    history: StateHistory,
}

/// Handle to a machine instance.
///
/// Cloning the handle is cheap and every clone refers to the same
/// instance; this is what the execution stack holds. The state graph is
/// fixed at construction. The current state, the context and the action
/// registry change in place.
///
/// Locks are never held while a user callback runs, so callbacks are free
/// to call back into the machine (directly or through the hooks).
///
/// # Example
///
/// ```rust
/// use statehook::builder::{MachineBuilder, StateBuilder};
/// use serde_json::Value;
///
/// let machine = MachineBuilder::new("door")
///     .initial("closed")
///     .state("closed", StateBuilder::new().on("OPEN", "open"))
///     .state("open", StateBuilder::new().on("CLOSE", "closed"))
///     .build()
///     .unwrap();
///
/// machine
///     .transition("OPEN", Value::Null)
///     .and_then(|m| m.transition("CLOSE", Value::Null))
///     .unwrap();
///
/// assert_eq!(machine.state(), "closed");
/// assert_eq!(machine.history().get_path(), vec!["closed", "open", "closed"]);
/// ```
#[derive(Clone)]
pub struct Machine {
    shared: Arc<Shared>,
}

/// A matched event whose exit actions have already run.
struct Dispatch<'a> {
    state: String,
    handler: &'a TransitionDefinition,
    exited: bool,
}

impl Machine {
    /// Construct a machine from `config`.
    ///
    /// The configuration is validated eagerly and every violation is
    /// reported at once.
    pub fn new(config: MachineConfig) -> Result<Self, BuildError> {
        Self::from_parts(config, &[])
    }

    pub(crate) fn from_parts(
        config: MachineConfig,
        recorded: &[ConfigViolation],
    ) -> Result<Self, BuildError> {
        if let Validation::Failure(errors) = validate(&config, recorded) {
            return Err(BuildError::InvalidConfig {
                violations: errors.iter().cloned().collect(),
            });
        }

        let context =
            Context::from_value(config.context).map_err(|found| BuildError::InvalidConfig {
                violations: vec![ConfigViolation::ContextNotObject {
                    found: json_kind(&found).to_string(),
                }],
            })?;

        let instance_id = Uuid::new_v4();
        tracing::debug!(
            machine = %config.id,
            %instance_id,
            initial = %config.initial_state,
            states = config.states.len(),
            "machine created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                id: config.id,
                instance_id,
                initial: config.initial_state.clone(),
                states: config.states,
                history_limit: config.history_limit,
                actions: Mutex::new(config.actions),
                runtime: Mutex::new(Runtime {
                    current: config.initial_state,
                    context,
                    history: StateHistory::new(),
                }),
            }),
        })
    }

    /// Configured identity; shared by every machine built from one config.
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Identity unique to this instance.
    pub fn instance_id(&self) -> Uuid {
        self.shared.instance_id
    }

    /// State the machine started in.
    pub fn initial_state(&self) -> &str {
        &self.shared.initial
    }

    /// Name of the current state.
    pub fn state(&self) -> String {
        self.runtime().current.clone()
    }

    /// Snapshot of the current context.
    pub fn context(&self) -> Context {
        self.runtime().context.clone()
    }

    /// Snapshot of the most recent state changes, oldest first.
    ///
    /// At most the configured history limit is kept.
    pub fn history(&self) -> StateHistory {
        self.runtime().history.clone()
    }

    /// Configured definition of `state`, if the graph has it.
    pub fn definition(&self, state: &str) -> Option<&StateDefinition> {
        self.shared.states.get(state)
    }

    /// Whether the graph has a state named `state`.
    pub fn has_state(&self, state: &str) -> bool {
        self.shared.states.contains_key(state)
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Machine) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Handle `event` in the current state.
    ///
    /// Runs the current state's exit actions, then either enters the
    /// transition's target (running its entry actions with `data`) or calls
    /// its service with `data`. Every callback runs with this machine on
    /// top of the execution stack.
    ///
    /// Fails with `UnknownEvent` before anything runs if the event is not
    /// handled. An event bound to an async service also fails before
    /// anything runs, with `AsyncServiceInSyncTransition`; use
    /// [`transition_async`](Self::transition_async) for those. Later
    /// failures leave the effects of callbacks that already ran in place.
    pub fn transition(&self, event: &str, data: Value) -> Result<&Self, MachineError> {
        let (state, handler) = self.lookup(event)?;
        let service: Option<&SyncService> = match &handler.service {
            Some(Service::Sync(service)) => Some(service),
            Some(Service::Async(_)) => {
                return Err(MachineError::AsyncServiceInSyncTransition {
                    machine: self.shared.id.clone(),
                    state,
                    event: event.to_string(),
                })
            }
            None => None,
        };

        let dispatch = self.exit(state, handler, event, &data)?;
        let result = match service {
            Some(service) => self.invoke(|| service(&data)),
            None => self.dispatch_target(&dispatch, event, &data),
        };
        self.finish(dispatch, event, result)
    }

    /// Like [`transition`](Self::transition), but also drives async services.
    ///
    /// The service's future keeps this machine on the execution stack while
    /// it is being polled, so hook accessors inside it resolve this machine
    /// after every suspension point.
    pub async fn transition_async(&self, event: &str, data: Value) -> Result<&Self, MachineError> {
        let (state, handler) = self.lookup(event)?;
        let dispatch = self.exit(state, handler, event, &data)?;
        let result = match &dispatch.handler.service {
            Some(Service::Sync(service)) => self.invoke(|| service(&data)),
            Some(Service::Async(service)) => {
                let future = {
                    let _guard = stack::enter(self);
                    service(data)
                };
                Bracketed::new(self.clone(), future).await
            }
            None => self.dispatch_target(&dispatch, event, &data),
        };
        self.finish(dispatch, event, result)
    }

    /// Assign the current state directly and run its entry actions.
    ///
    /// Entry actions receive `Null` as data.
    pub fn set_state(&self, target: &str) -> Result<(), MachineError> {
        self.enter_state(target, None, &Value::Null)
    }

    /// Shallow-merge `patch` into the context.
    ///
    /// `Null` is a no-op; any value other than an object is rejected.
    pub fn set_context(&self, patch: Value) -> Result<(), MachineError> {
        match patch {
            Value::Object(patch) => {
                self.runtime().context.merge(patch);
                Ok(())
            }
            Value::Null => Ok(()),
            other => Err(MachineError::InvalidContextPatch {
                machine: self.shared.id.clone(),
                found: json_kind(&other).to_string(),
            }),
        }
    }

    /// Look up a named action in the registry.
    pub fn resolve_action(&self, name: &str) -> Result<Action, MachineError> {
        self.registry()
            .get(name)
            .ok_or_else(|| MachineError::UnknownAction {
                machine: self.shared.id.clone(),
                action: name.to_string(),
            })
    }

    /// Register or replace a named action.
    ///
    /// Every name a state refers to must already be registered when the
    /// machine is built; registering afterwards swaps the implementation
    /// of such a name or adds one for [`resolve_action`](Self::resolve_action).
    pub fn register_action<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value) -> Result<(), MachineError> + Send + Sync + 'static,
    {
        self.registry().register(name, f);
    }

    /// Remove a named action; returns whether it was registered.
    pub fn remove_action(&self, name: &str) -> bool {
        self.registry().remove(name).is_some()
    }

    /// Run the current state's `phase` actions with `data`.
    pub fn run_actions(&self, phase: Phase, data: &Value) -> Result<(), MachineError> {
        let state = self.state();
        self.run_phase(&state, phase, data)
    }

    /// Find the handler for `event` in the current state.
    fn lookup(&self, event: &str) -> Result<(String, &TransitionDefinition), MachineError> {
        let state = self.state();
        let handler = self
            .definition_of(&state)?
            .on
            .get(event)
            .ok_or_else(|| MachineError::UnknownEvent {
                machine: self.shared.id.clone(),
                state: state.clone(),
                event: event.to_string(),
            })?;
        Ok((state, handler))
    }

    /// Run the exit actions of `state`, the first side effect of a transition.
    fn exit<'a>(
        &self,
        state: String,
        handler: &'a TransitionDefinition,
        event: &str,
        data: &Value,
    ) -> Result<Dispatch<'a>, MachineError> {
        tracing::debug!(machine = %self.shared.id, %state, event, "transition started");

        let exited = self.definition_of(&state)?.on_exit.is_some();
        if let Err(error) = self.run_phase(&state, Phase::Exit, data) {
            tracing::warn!(machine = %self.shared.id, %state, event, %error, "exit action failed");
            return Err(error);
        }

        Ok(Dispatch {
            state,
            handler,
            exited,
        })
    }

    fn dispatch_target(
        &self,
        dispatch: &Dispatch<'_>,
        event: &str,
        data: &Value,
    ) -> Result<(), MachineError> {
        match &dispatch.handler.target {
            Some(target) => self.enter_state(target, Some(event), data),
            None => Err(MachineError::MissingTarget {
                machine: self.shared.id.clone(),
                state: dispatch.state.clone(),
                event: event.to_string(),
            }),
        }
    }

    fn finish(
        &self,
        dispatch: Dispatch<'_>,
        event: &str,
        result: Result<(), MachineError>,
    ) -> Result<&Self, MachineError> {
        match result {
            Ok(()) => {
                tracing::debug!(
                    machine = %self.shared.id,
                    from = %dispatch.state,
                    state = %self.state(),
                    event,
                    "transition complete"
                );
                Ok(self)
            }
            Err(error) => {
                if dispatch.exited {
                    tracing::warn!(
                        machine = %self.shared.id,
                        state = %dispatch.state,
                        event,
                        %error,
                        "transition failed after exit actions ran"
                    );
                }
                Err(error)
            }
        }
    }

    fn enter_state(
        &self,
        target: &str,
        event: Option<&str>,
        data: &Value,
    ) -> Result<(), MachineError> {
        self.definition_of(target)?;

        let from = {
            let mut runtime = self.runtime();
            let from = std::mem::replace(&mut runtime.current, target.to_string());
            runtime.history.push(
                StateTransition::new(from.clone(), target, event.map(str::to_string)),
                self.shared.history_limit,
            );
            from
        };
        tracing::debug!(machine = %self.shared.id, %from, to = target, "state changed");

        self.run_phase(target, Phase::Entry, data)
    }

    fn run_phase(&self, state: &str, phase: Phase, data: &Value) -> Result<(), MachineError> {
        let Some(actions) = self.definition_of(state)?.actions(phase) else {
            return Ok(());
        };

        // The whole list is resolved before the first action runs.
        for action in self.resolve_all(actions)? {
            self.invoke(|| action(data))?;
        }
        Ok(())
    }

    fn resolve_all(&self, actions: &Actions) -> Result<Vec<Action>, MachineError> {
        let registry = self.registry();
        actions
            .refs()
            .iter()
            .map(|action| match action {
                ActionRef::Inline(action) => Ok(Arc::clone(action)),
                ActionRef::Named(name) => {
                    registry
                        .get(name)
                        .ok_or_else(|| MachineError::UnknownAction {
                            machine: self.shared.id.clone(),
                            action: name.clone(),
                        })
                }
            })
            .collect()
    }

    /// Run `f` with this machine on top of the execution stack.
    fn invoke<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = stack::enter(self);
        f()
    }

    fn definition_of(&self, state: &str) -> Result<&StateDefinition, MachineError> {
        self.shared
            .states
            .get(state)
            .ok_or_else(|| MachineError::UnknownState {
                machine: self.shared.id.clone(),
                state: state.to_string(),
            })
    }

    fn runtime(&self) -> MutexGuard<'_, Runtime> {
        self.shared
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn registry(&self) -> MutexGuard<'_, ActionRegistry> {
        self.shared
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.shared.id)
            .field("instance_id", &self.shared.instance_id)
            .field("state", &self.state())
            .finish()
    }
}
