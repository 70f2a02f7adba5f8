//! The state machine engine.
//!
//! # Key Concepts
//!
//! - **Machine**: shared handle to one instance with its own state graph,
//!   context, action registry and current state
//! - **Transition protocol**: exit actions, then a target (with entry
//!   actions) or a service
//! - **Execution stack**: every callback runs with its machine pushed onto
//!   the thread's stack, which is what the hooks read
//!
//! # Async services
//!
//! A plain push/pop around a call only covers the synchronous part of the
//! callback. Async services are therefore wrapped so their machine is
//! pushed around every poll of the returned future (see
//! [`Machine::transition_async`]). Code that leaves that future, such as a
//! spawned task or a stored closure, must carry the machine explicitly via
//! [`current_machine`](crate::hooks::current_machine) or a captured setter;
//! hooks called there fail with `EmptyStack`.

mod action;
mod error;
mod machine;
mod service;

pub use action::{Action, ActionRef, ActionRegistry, Actions};
pub use error::MachineError;
pub use machine::Machine;
pub use service::{AsyncService, BoxFuture, Service, SyncService};
