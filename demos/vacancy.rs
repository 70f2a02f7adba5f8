//! Vacancy Workflow
//!
//! This example drives a job vacancy through its lifecycle with a
//! JSON-defined state graph, named actions, and a service that finishes
//! after a delay.
//!
//! Key concepts:
//! - State graph loaded from JSON, completed with callables in code
//! - Hooks reading and updating the machine that invoked the service
//! - An async service resolving its machine again after `sleep`
//!
//! Run with: RUST_LOG=statehook=debug cargo run --example vacancy

use serde_json::{json, Value};
use statehook::builder::{MachineBuilder, MachineConfig};
use statehook::engine::Service;
use statehook::hooks::{current_context, current_state};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const VACANCY: &str = r#"{
    "id": "vacancy",
    "initialState": "notResponded",
    "context": {"id": 123},
    "states": {
        "notResponded": {
            "onExit": "logExit",
            "on": {
                "RESPOND": {}
            }
        },
        "responded": {
            "onEntry": ["logEntry", "notifyApplicant"]
        }
    }
}"#;

fn respond() -> Service {
    Service::future(|data: Value| async move {
        let (context, set_context) = current_context()?;
        println!("Responding to vacancy {} ...", context.get("id").unwrap_or(&Value::Null));

        tokio::time::sleep(Duration::from_millis(200)).await;

        set_context(json!({"completed": true, "resume": data.get("resume").cloned()}))?;
        let (_state, set_state) = current_state()?;
        set_state("responded")
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Vacancy Workflow Example ===\n");

    let config = MachineConfig::from_json(VACANCY)?;
    let machine = MachineBuilder::from_config(config)
        .action("logExit", |_| {
            let (state, _) = current_state()?;
            println!("Leaving state: {state}");
            Ok(())
        })
        .action("logEntry", |_| {
            let (state, _) = current_state()?;
            println!("Entered state: {state}");
            Ok(())
        })
        .action("notifyApplicant", |_| {
            let (context, _) = current_context()?;
            println!("Notifying applicant, context: {:?}", context.as_map());
            Ok(())
        })
        .service("notResponded", "RESPOND", respond())
        .build()?;

    println!("Initial state: {}", machine.state());

    machine
        .transition_async("RESPOND", json!({"resume": {"name": "Ada"}}))
        .await?;

    println!("Final state: {}", machine.state());
    println!("Path: {:?}", machine.history().get_path());

    println!("\n=== Example Complete ===");
    Ok(())
}
