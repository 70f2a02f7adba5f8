//! Configuration schema and builders.
//!
//! A machine is described by a [`MachineConfig`]: the state graph, the
//! initial state and context, and the action registry. Configurations can
//! be parsed from JSON or assembled with [`MachineBuilder`] and
//! [`StateBuilder`]; both paths are validated when the machine is built.

pub mod config;
pub mod error;
pub mod machine;
pub mod state;

pub use config::{
    MachineConfig, Phase, StateDefinition, TransitionDefinition, DEFAULT_HISTORY_LIMIT,
};
pub use error::BuildError;
pub use machine::MachineBuilder;
pub use state::StateBuilder;
