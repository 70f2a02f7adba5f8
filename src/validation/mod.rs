//! Construction-time validation of machine configurations.
//!
//! Validation uses Stillwater's `Validation` type so that a single pass
//! reports every problem in a configuration instead of stopping at the
//! first one.
//!
//! Checked at construction:
//!
//! - the initial state exists
//! - every `target` names a state in the graph
//! - every named action in `onEntry`/`onExit` is registered
//! - no transition declares both a target and a service
//! - state names are unique and the context is an object
//!
//! A transition with neither target nor service is not a construction
//! error; it fails with `MissingTarget` when its event fires.

mod rules;
mod violations;

pub use rules::validate;
pub use violations::ConfigViolation;
