//! State change history.
//!
//! Every assignment of a machine's current state is recorded as a
//! timestamped [`StateTransition`]. Histories are values: `record` returns
//! a new history and leaves the original untouched. A running machine
//! appends in place and keeps only its most recent transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single state change.
///
/// `event` is the event that caused the change, or `None` when the state
/// was assigned directly through `set_state`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: String,
    pub to: String,
    pub event: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StateTransition {
    /// Create a transition stamped with the current time.
    pub fn new(from: impl Into<String>, to: impl Into<String>, event: Option<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            event,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered history of state changes.
///
/// # Example
///
/// ```rust
/// use statehook::core::{StateHistory, StateTransition};
///
/// let history = StateHistory::new()
///     .record(StateTransition::new("idle", "open", Some("PUBLISH".to_string())))
///     .record(StateTransition::new("open", "closed", None));
///
/// assert_eq!(history.get_path(), vec!["idle", "open", "closed"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<StateTransition>,
}

impl StateHistory {
    pub fn new() -> Self {
        Self {
            transitions: VecDeque::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push_back(transition);
        Self { transitions }
    }

    /// Append in place, dropping the oldest entries beyond `limit`.
    ///
    /// A `limit` of zero records nothing.
    pub(crate) fn push(&mut self, transition: StateTransition, limit: usize) {
        if limit == 0 {
            return;
        }
        while self.transitions.len() >= limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// States traversed: the first `from`, then each `to` in order.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            path.push(first.from.as_str());
        }
        for transition in &self.transitions {
            path.push(transition.to.as_str());
        }
        path
    }

    /// Time between the first and last recorded transition.
    ///
    /// Returns `None` for an empty history.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Recorded transitions, oldest first.
    pub fn transitions(&self) -> &VecDeque<StateTransition> {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
