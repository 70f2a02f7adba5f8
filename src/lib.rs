//! Statehook: a state machine engine with hook-style access to the running machine
//!
//! A machine is built from a static configuration: a graph of named states,
//! each with optional entry/exit actions and a table of events. An event
//! either moves the machine to a target state or hands control to a
//! service. Actions and services do not receive the machine as an
//! argument. Instead they call hook accessors such as
//! [`hooks::current_state`], which resolve the machine that invoked them
//! through a per-thread execution stack.
//!
//! # Core Concepts
//!
//! - **Machine**: one configured instance with its own context and current state
//! - **Execution stack**: LIFO record of which machine is running a callback
//! - **Hooks**: context-free accessors for the state and context of that machine
//! - **Validation**: every configuration problem is reported at construction
//!
//! # Example
//!
//! ```rust
//! use statehook::builder::{MachineBuilder, StateBuilder};
//! use statehook::engine::Service;
//! use statehook::hooks::{current_context, current_state};
//! use serde_json::json;
//!
//! let machine = MachineBuilder::new("review")
//!     .initial("pending")
//!     .action("notify", |_data| Ok(()))
//!     .state(
//!         "pending",
//!         StateBuilder::new().invoke(
//!             "DECIDE",
//!             Service::sync(|data| {
//!                 let (_context, set_context) = current_context()?;
//!                 set_context(json!({"decision": data.clone()}))?;
//!                 let (_state, set_state) = current_state()?;
//!                 set_state("decided")
//!             }),
//!         ),
//!     )
//!     .state("decided", StateBuilder::new().entry("notify"))
//!     .build()
//!     .unwrap();
//!
//! machine.transition("DECIDE", json!("approved")).unwrap();
//!
//! assert_eq!(machine.state(), "decided");
//! assert_eq!(machine.context().get("decision"), Some(&json!("approved")));
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod hooks;
pub mod stack;
pub mod validation;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder, MachineConfig, StateBuilder};
pub use crate::core::{Context, StateHistory, StateTransition};
pub use engine::{Machine, MachineError, Service};
pub use hooks::{current_context, current_machine, current_state};
