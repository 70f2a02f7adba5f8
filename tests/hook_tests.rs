//! Hook accessors resolving the executing machine, including nested and
//! asynchronous invocations.

use serde_json::{json, Value};
use statehook::builder::{MachineBuilder, StateBuilder, TransitionDefinition};
use statehook::engine::{Actions, Machine, MachineError, Service};
use statehook::hooks::{current_context, current_machine, current_state};
use statehook::stack;
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn target_transition_invokes_named_entry_action_once() {
    let log: Log = Arc::default();
    let sink = Arc::clone(&log);
    let machine = MachineBuilder::new("m")
        .initial("A")
        .action("log", move |_| {
            push(&sink, "log");
            Ok(())
        })
        .state("A", StateBuilder::new().on("GO", "B"))
        .state("B", StateBuilder::new().entry("log"))
        .build()
        .unwrap();

    assert_eq!(machine.state(), "A");
    machine.transition("GO", Value::Null).unwrap();

    assert_eq!(machine.state(), "B");
    assert_eq!(entries(&log), vec!["log"]);
}

#[test]
fn service_advances_machine_through_hooks() {
    let machine = MachineBuilder::new("m")
        .initial("A")
        .context(json!({"attempts": 1}))
        .state(
            "A",
            StateBuilder::new().invoke(
                "RUN",
                Service::sync(|_| {
                    let (_state, set_state) = current_state()?;
                    set_state("B")?;
                    let (_context, set_context) = current_context()?;
                    set_context(json!({"done": true}))
                }),
            ),
        )
        .state("B", StateBuilder::new())
        .build()
        .unwrap();

    machine.transition("RUN", Value::Null).unwrap();

    assert_eq!(machine.state(), "B");
    let context = machine.context();
    assert_eq!(context.get("done"), Some(&json!(true)));
    assert_eq!(context.get("attempts"), Some(&json!(1)));
}

#[test]
fn hooks_see_state_and_context_of_the_invoking_machine() {
    let machine = MachineBuilder::new("m")
        .initial("A")
        .context(json!({"name": "first"}))
        .state(
            "A",
            StateBuilder::new().invoke(
                "CHECK",
                Service::sync(|data| {
                    let (state, _) = current_state()?;
                    let (context, _) = current_context()?;
                    assert_eq!(state, "A");
                    assert_eq!(context.get("name"), Some(&json!("first")));
                    assert_eq!(data, &json!({"payload": 7}));
                    Ok(())
                }),
            ),
        )
        .build()
        .unwrap();

    machine.transition("CHECK", json!({"payload": 7})).unwrap();
    // The service did not advance the machine.
    assert_eq!(machine.state(), "A");
}

#[test]
fn exit_actions_complete_before_service_starts() {
    let log: Log = Arc::default();
    let exit_log = Arc::clone(&log);
    let service_log = Arc::clone(&log);

    let machine = MachineBuilder::new("m")
        .initial("A")
        .state(
            "A",
            StateBuilder::new()
                .exit(Actions::inline(move |_| {
                    push(&exit_log, "exit");
                    Ok(())
                }))
                .invoke(
                    "RUN",
                    Service::sync(move |_| {
                        let seen = entries(&service_log);
                        push(&service_log, format!("service after {seen:?}"));
                        Ok(())
                    }),
                ),
        )
        .build()
        .unwrap();

    machine.transition("RUN", Value::Null).unwrap();

    assert_eq!(entries(&log), vec!["exit", "service after [\"exit\"]"]);
}

#[test]
fn missing_target_keeps_state_and_exit_side_effects() {
    let exits = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&exits);
    let machine = MachineBuilder::new("m")
        .initial("A")
        .state(
            "A",
            StateBuilder::new()
                .exit(Actions::inline(move |_| {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                }))
                .transition("BROKEN", TransitionDefinition::default()),
        )
        .build()
        .unwrap();

    let error = machine.transition("BROKEN", Value::Null).unwrap_err();

    assert_eq!(
        error,
        MachineError::MissingTarget {
            machine: "m".to_string(),
            state: "A".to_string(),
            event: "BROKEN".to_string(),
        }
    );
    assert_eq!(machine.state(), "A");
    assert_eq!(*exits.lock().unwrap(), 1);
}

#[test]
fn service_error_surfaces_to_caller() {
    let machine = MachineBuilder::new("m")
        .initial("A")
        .state(
            "A",
            StateBuilder::new().invoke(
                "RUN",
                Service::sync(|_| {
                    let (_state, set_state) = current_state()?;
                    set_state("Nowhere")
                }),
            ),
        )
        .build()
        .unwrap();

    let error = machine.transition("RUN", Value::Null).unwrap_err();

    assert_eq!(
        error,
        MachineError::UnknownState {
            machine: "m".to_string(),
            state: "Nowhere".to_string(),
        }
    );
    assert!(stack::is_empty());
}

#[test]
fn nested_machines_resolve_innermost_invocation() {
    let log: Log = Arc::default();

    let inner_log = Arc::clone(&log);
    let inner = MachineBuilder::new("inner")
        .initial("idle")
        .state("idle", StateBuilder::new().on("WAKE", "awake"))
        .state(
            "awake",
            StateBuilder::new().entry(Actions::inline(move |_| {
                let machine = current_machine()?;
                push(
                    &inner_log,
                    format!("entry of {} at depth {}", machine.id(), stack::depth()),
                );
                Ok(())
            })),
        )
        .build()
        .unwrap();

    let outer_log = Arc::clone(&log);
    let target = inner.clone();
    let outer = MachineBuilder::new("outer")
        .initial("start")
        .state(
            "start",
            StateBuilder::new().invoke(
                "DELEGATE",
                Service::sync(move |_| {
                    target.transition("WAKE", Value::Null)?;
                    let machine = current_machine()?;
                    push(&outer_log, format!("service of {}", machine.id()));
                    let (_state, set_state) = current_state()?;
                    set_state("done")
                }),
            ),
        )
        .state("done", StateBuilder::new())
        .build()
        .unwrap();

    outer.transition("DELEGATE", Value::Null).unwrap();

    assert_eq!(
        entries(&log),
        vec!["entry of inner at depth 2", "service of outer"]
    );
    assert_eq!(outer.state(), "done");
    assert_eq!(inner.state(), "awake");
    assert!(stack::is_empty());
}

#[test]
fn deferred_hook_call_fails_deterministically() {
    let deferred: Arc<Mutex<Vec<Box<dyn FnOnce() -> Result<(), MachineError> + Send>>>> =
        Arc::default();
    let queue = Arc::clone(&deferred);

    let machine = MachineBuilder::new("m")
        .initial("A")
        .state(
            "A",
            StateBuilder::new().invoke(
                "LATER",
                Service::sync(move |_| {
                    queue.lock().unwrap().push(Box::new(|| {
                        let (_context, set_context) = current_context()?;
                        set_context(json!({"late": true}))
                    }));
                    Ok(())
                }),
            ),
        )
        .build()
        .unwrap();

    machine.transition("LATER", Value::Null).unwrap();

    let continuation = deferred.lock().unwrap().pop().unwrap();
    assert_eq!(continuation(), Err(MachineError::EmptyStack));
    assert_eq!(machine.context().get("late"), None);
}

#[test]
fn deferred_call_inside_another_machine_uses_captured_machine() {
    // The continuation outlives its service and later runs while a different
    // machine is on top of the stack. Capturing the machine (or its setter)
    // keeps it pointed at the right instance.
    let deferred: Arc<Mutex<Vec<Box<dyn FnOnce() -> Result<(), MachineError> + Send>>>> =
        Arc::default();
    let queue = Arc::clone(&deferred);

    let owner = MachineBuilder::new("owner")
        .initial("A")
        .state(
            "A",
            StateBuilder::new().invoke(
                "LATER",
                Service::sync(move |_| {
                    let machine = current_machine()?;
                    let (_context, set_context) = current_context()?;
                    queue.lock().unwrap().push(Box::new(move || {
                        set_context(json!({"late": true}))?;
                        machine.set_state("B")
                    }));
                    Ok(())
                }),
            ),
        )
        .state("B", StateBuilder::new())
        .build()
        .unwrap();

    let pending = Arc::clone(&deferred);
    let bystander = MachineBuilder::new("bystander")
        .initial("idle")
        .state(
            "idle",
            StateBuilder::new().invoke(
                "TICK",
                Service::sync(move |_| {
                    let continuation = pending.lock().unwrap().pop();
                    if let Some(continuation) = continuation {
                        continuation()?;
                    }
                    Ok(())
                }),
            ),
        )
        .build()
        .unwrap();

    owner.transition("LATER", Value::Null).unwrap();
    bystander.transition("TICK", Value::Null).unwrap();

    assert_eq!(owner.state(), "B");
    assert_eq!(owner.context().get("late"), Some(&json!(true)));
    assert_eq!(bystander.state(), "idle");
    assert_eq!(bystander.context().get("late"), None);
}

fn counting_machine(id: &str, rounds: u64) -> Machine {
    let expected = id.to_string();
    MachineBuilder::new(id)
        .initial("idle")
        .context(json!({"count": 0}))
        .state(
            "idle",
            StateBuilder::new().invoke(
                "COUNT",
                Service::future(move |_| {
                    let expected = expected.clone();
                    async move {
                        for _ in 0..rounds {
                            let (context, set_context) = current_context()?;
                            let count = context.get("count").and_then(Value::as_u64).unwrap_or(0);
                            tokio::task::yield_now().await;
                            // Resolving again after the suspension point must
                            // still find this machine.
                            assert_eq!(current_machine()?.id(), expected);
                            set_context(json!({"count": count + 1}))?;
                        }
                        let (_state, set_state) = current_state()?;
                        set_state("counted")
                    }
                }),
            ),
        )
        .state("counted", StateBuilder::new())
        .build()
        .unwrap()
}

#[tokio::test]
async fn async_services_keep_their_machine_across_suspension() {
    let first = counting_machine("first", 5);
    let second = counting_machine("second", 3);

    let (a, b) = tokio::join!(
        first.transition_async("COUNT", Value::Null),
        second.transition_async("COUNT", Value::Null),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(first.state(), "counted");
    assert_eq!(second.state(), "counted");
    assert_eq!(first.context().get("count"), Some(&json!(5)));
    assert_eq!(second.context().get("count"), Some(&json!(3)));
    assert!(stack::is_empty());
}

#[tokio::test]
async fn async_service_interleaved_with_other_machine_sees_no_leak() {
    let observed: Log = Arc::default();
    let sink = Arc::clone(&observed);

    let waiting = MachineBuilder::new("waiting")
        .initial("idle")
        .state(
            "idle",
            StateBuilder::new().invoke(
                "WAIT",
                Service::future(move |_| {
                    let sink = Arc::clone(&sink);
                    async move {
                        tokio::task::yield_now().await;
                        push(&sink, current_machine()?.id());
                        Ok(())
                    }
                }),
            ),
        )
        .build()
        .unwrap();

    let busy = MachineBuilder::new("busy")
        .initial("idle")
        .state("idle", StateBuilder::new().on("GO", "busy"))
        .state("busy", StateBuilder::new())
        .build()
        .unwrap();

    let other = async {
        tokio::task::yield_now().await;
        // Between polls of the waiting service, nothing is on the stack.
        assert!(stack::is_empty());
        busy.transition("GO", Value::Null).map(|_| ())
    };

    let (a, b) = tokio::join!(waiting.transition_async("WAIT", Value::Null), other);
    a.unwrap();
    b.unwrap();

    assert_eq!(entries(&observed), vec!["waiting"]);
    assert_eq!(busy.state(), "busy");
}

#[tokio::test]
async fn spawned_continuation_must_capture_machine() {
    let results: Arc<Mutex<Vec<Result<String, MachineError>>>> = Arc::default();
    let sink = Arc::clone(&results);

    let machine = MachineBuilder::new("spawner")
        .initial("idle")
        .state(
            "idle",
            StateBuilder::new().invoke(
                "SPAWN",
                Service::future(move |_| {
                    let sink = Arc::clone(&sink);
                    async move {
                        let captured = current_machine()?;
                        let handle = tokio::spawn(async move {
                            let ambient = current_machine().map(|m| m.id().to_string());
                            captured.set_context(json!({"from_task": true}))?;
                            Ok::<_, MachineError>(ambient)
                        });
                        let ambient = handle
                            .await
                            .map_err(|e| MachineError::ActionFailed(e.to_string()))??;
                        sink.lock().unwrap().push(ambient);
                        Ok(())
                    }
                }),
            ),
        )
        .build()
        .unwrap();

    machine.transition_async("SPAWN", Value::Null).await.unwrap();

    assert_eq!(
        results.lock().unwrap().clone(),
        vec![Err(MachineError::EmptyStack)]
    );
    assert_eq!(machine.context().get("from_task"), Some(&json!(true)));
}

#[tokio::test]
async fn transition_async_runs_sync_services_and_targets() {
    let machine = MachineBuilder::new("m")
        .initial("A")
        .state(
            "A",
            StateBuilder::new().invoke(
                "RUN",
                Service::sync(|_| {
                    let (_state, set_state) = current_state()?;
                    set_state("B")
                }),
            ),
        )
        .state("B", StateBuilder::new().on("NEXT", "C"))
        .state("C", StateBuilder::new())
        .build()
        .unwrap();

    machine.transition_async("RUN", Value::Null).await.unwrap();
    machine.transition_async("NEXT", Value::Null).await.unwrap();

    assert_eq!(machine.state(), "C");
    assert_eq!(machine.history().get_path(), vec!["A", "B", "C"]);
}
