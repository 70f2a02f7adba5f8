//! Value types shared by the engine and its configuration.
//!
//! - `Context`: the opaque key/value record a machine carries
//! - `StateHistory`: timestamped record of every state change
//!
//! Nothing in this module knows about the execution stack.

mod context;
mod history;

pub(crate) use context::json_kind;
pub use context::Context;
pub use history::{StateHistory, StateTransition};
