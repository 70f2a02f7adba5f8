//! Errors raised while constructing machines.

use crate::validation::ConfigViolation;
use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    /// Every violation found in the configuration, in a stable order.
    #[error("Invalid machine configuration ({} violations): {}", .violations.len(), first_violation(.violations))]
    InvalidConfig { violations: Vec<ConfigViolation> },

    #[error("Failed to parse machine configuration: {0}")]
    Parse(String),
}

impl BuildError {
    /// Violations carried by `InvalidConfig`; empty for other variants.
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            Self::InvalidConfig { violations } => violations,
            _ => &[],
        }
    }
}

fn first_violation(violations: &[ConfigViolation]) -> String {
    violations
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}
