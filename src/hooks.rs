//! Hook accessors for the machine that is running a callback right now.
//!
//! These functions take no machine argument: they resolve the top of the
//! current thread's execution stack. They are valid inside actions, sync
//! services, and async services driven by `transition_async`. Anywhere
//! else they fail with [`MachineError::EmptyStack`].
//!
//! The setters returned alongside each value capture the resolved machine,
//! so calling a setter later still targets that machine even after the
//! callback has returned.
//!
//! # Example
//!
//! ```rust
//! use statehook::builder::{MachineBuilder, StateBuilder};
//! use statehook::engine::Service;
//! use statehook::hooks::{current_context, current_state};
//! use serde_json::{json, Value};
//!
//! let machine = MachineBuilder::new("vacancy")
//!     .initial("open")
//!     .context(json!({"applicants": 0}))
//!     .state("open", StateBuilder::new().invoke("APPLY", Service::sync(|_data| {
//!         let (context, set_context) = current_context()?;
//!         let applicants = context.get("applicants").and_then(Value::as_u64).unwrap_or(0);
//!         set_context(json!({"applicants": applicants + 1}))?;
//!
//!         let (_state, set_state) = current_state()?;
//!         set_state("closed")
//!     })))
//!     .state("closed", StateBuilder::new())
//!     .build()
//!     .unwrap();
//!
//! machine.transition("APPLY", Value::Null).unwrap();
//! assert_eq!(machine.state(), "closed");
//! assert_eq!(machine.context().get("applicants"), Some(&json!(1)));
//! ```

use crate::core::Context;
use crate::engine::{Machine, MachineError};
use crate::stack;
use serde_json::Value;

/// The machine currently executing a callback.
pub fn current_machine() -> Result<Machine, MachineError> {
    stack::top()
}

/// Context snapshot of the executing machine, with a merge setter.
pub fn current_context(
) -> Result<(Context, impl Fn(Value) -> Result<(), MachineError>), MachineError> {
    let machine = stack::top()?;
    let context = machine.context();
    Ok((context, move |patch: Value| machine.set_context(patch)))
}

/// Current state name of the executing machine, with a `set_state` setter.
pub fn current_state(
) -> Result<(String, impl Fn(&str) -> Result<(), MachineError>), MachineError> {
    let machine = stack::top()?;
    let state = machine.state();
    Ok((state, move |target: &str| machine.set_state(target)))
}
