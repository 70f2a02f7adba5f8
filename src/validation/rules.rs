//! Validation rules applied to a machine configuration.

use crate::builder::{MachineConfig, Phase};
use crate::core::json_kind;
use crate::engine::ActionRef;
use crate::validation::violations::ConfigViolation;
use serde_json::Value;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigViolation>>;

fn check(violation: Option<ConfigViolation>) -> Check {
    match violation {
        Some(violation) => Validation::fail(violation),
        None => Validation::success(()),
    }
}

/// Validate `config`, accumulating ALL violations.
///
/// `recorded` carries problems the builder noticed before the
/// configuration was assembled (duplicate state names, services attached
/// to missing states); they are reported first. States and events are
/// visited in name order so the result is deterministic.
pub fn validate(config: &MachineConfig, recorded: &[ConfigViolation]) -> Check {
    let mut checks: Vec<Check> = recorded
        .iter()
        .cloned()
        .map(|violation| check(Some(violation)))
        .collect();

    checks.push(check(
        (!config.states.contains_key(&config.initial_state)).then(|| {
            ConfigViolation::UnknownInitialState {
                initial: config.initial_state.clone(),
            }
        }),
    ));

    checks.push(check(match &config.context {
        Value::Object(_) | Value::Null => None,
        other => Some(ConfigViolation::ContextNotObject {
            found: json_kind(other).to_string(),
        }),
    }));

    let mut state_names: Vec<&String> = config.states.keys().collect();
    state_names.sort();

    for state_name in state_names {
        let definition = &config.states[state_name];

        for phase in [Phase::Exit, Phase::Entry] {
            let Some(actions) = definition.actions(phase) else {
                continue;
            };
            for action in actions.refs() {
                if let ActionRef::Named(name) = action {
                    checks.push(check((!config.actions.contains(name)).then(|| {
                        ConfigViolation::UnknownAction {
                            state: state_name.clone(),
                            phase,
                            action: name.clone(),
                        }
                    })));
                }
            }
        }

        let mut events: Vec<&String> = definition.on.keys().collect();
        events.sort();

        for event in events {
            let transition = &definition.on[event];

            if transition.service.is_some() && transition.target.is_some() {
                checks.push(check(Some(ConfigViolation::AmbiguousTransition {
                    state: state_name.clone(),
                    event: event.clone(),
                })));
            }

            if let Some(target) = &transition.target {
                checks.push(check((!config.states.contains_key(target)).then(|| {
                    ConfigViolation::UnknownTarget {
                        state: state_name.clone(),
                        event: event.clone(),
                        target: target.clone(),
                    }
                })));
            }
        }
    }

    Validation::all_vec(checks).map(|_| ())
}
