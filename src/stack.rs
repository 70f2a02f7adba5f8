//! The execution stack: which machine is running a callback right now.
//!
//! The engine pushes a machine handle immediately before invoking any user
//! callback and pops it right after the callback returns. Hook accessors
//! read the top entry. Nested invocations (machine A's service driving
//! machine B) stack up in LIFO order, so the top is always the innermost
//! active invocation.
//!
//! There is one stack per thread. Entries are shared handles, never
//! snapshots, and the stack holds them only for the duration of a callback.

use crate::engine::{Machine, MachineError};
use std::cell::RefCell;

/// LIFO container of executing machines.
#[derive(Debug, Default)]
pub struct MachineStack {
    entries: Vec<Machine>,
}

impl MachineStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `machine` on top.
    pub fn push(&mut self, machine: Machine) {
        self.entries.push(machine);
    }

    /// Remove and return the most recently pushed machine.
    pub fn pop(&mut self) -> Result<Machine, MachineError> {
        self.entries.pop().ok_or(MachineError::EmptyStack)
    }

    /// The most recently pushed machine, left in place.
    pub fn peek(&self) -> Result<&Machine, MachineError> {
        self.entries.last().ok_or(MachineError::EmptyStack)
    }

    /// Whether no machine is executing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of active invocations, nested ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

thread_local! {
    static STACK: RefCell<MachineStack> = RefCell::new(MachineStack::new());
}

/// Pops the entry pushed by [`enter`] when dropped, including on unwind.
#[must_use = "the machine is popped as soon as the guard is dropped"]
pub(crate) struct StackGuard {
    _private: (),
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Ok(machine) = stack.pop() {
                tracing::trace!(machine = machine.id(), depth = stack.len(), "popped machine");
            }
        });
    }
}

/// Push `machine` onto this thread's stack until the guard drops.
pub(crate) fn enter(machine: &Machine) -> StackGuard {
    STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.push(machine.clone());
        tracing::trace!(machine = machine.id(), depth = stack.len(), "pushed machine");
    });
    StackGuard { _private: () }
}

/// The machine at the top of this thread's stack.
pub fn top() -> Result<Machine, MachineError> {
    STACK.with(|stack| stack.borrow().peek().cloned())
}

/// Number of machines currently executing callbacks on this thread.
pub fn depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

/// Whether no machine is executing a callback on this thread.
pub fn is_empty() -> bool {
    STACK.with(|stack| stack.borrow().is_empty())
}
