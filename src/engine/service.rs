//! Services: callables that take over a transition instead of a target.

use crate::engine::error::MachineError;
use crate::engine::machine::Machine;
use crate::stack;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Owned, type-erased future returned by async services.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub type SyncService = Arc<dyn Fn(&Value) -> Result<(), MachineError> + Send + Sync>;

pub type AsyncService = Arc<dyn Fn(Value) -> BoxFuture<Result<(), MachineError>> + Send + Sync>;

/// A service invoked with the event data.
///
/// The service alone decides whether and how the machine advances, usually
/// through the hook accessors. Its `Ok` value carries no meaning for the
/// engine.
#[derive(Clone)]
pub enum Service {
    /// Runs to completion inside the transition call.
    Sync(SyncService),

    /// Returns a future; only `Machine::transition_async` can drive it.
    Async(AsyncService),
}

impl Service {
    /// Wrap a closure as a service that completes synchronously.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), MachineError> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Wrap an async function as a service.
    ///
    /// # Example
    ///
    /// ```rust
    /// use statehook::engine::Service;
    /// use statehook::hooks::current_state;
    ///
    /// let service = Service::future(|_data| async move {
    ///     let (_state, set_state) = current_state()?;
    ///     set_state("done")
    /// });
    /// assert!(service.is_async());
    /// ```
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), MachineError>> + Send + 'static,
    {
        Self::Async(Arc::new(move |data| Box::pin(f(data))))
    }

    /// Whether only `Machine::transition_async` can drive this service.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Service::Sync(..)"),
            Self::Async(_) => f.write_str("Service::Async(..)"),
        }
    }
}

/// Future that keeps its machine on the execution stack while it is polled.
///
/// The machine is pushed before every poll of the inner future and popped
/// when that poll returns, so code running inside the future between two
/// suspension points always resolves the owning machine, while other tasks
/// scheduled on the same thread in between never see it.
pub(crate) struct Bracketed {
    machine: Machine,
    inner: BoxFuture<Result<(), MachineError>>,
}

impl Bracketed {
    pub(crate) fn new(machine: Machine, inner: BoxFuture<Result<(), MachineError>>) -> Self {
        Self { machine, inner }
    }
}

impl Future for Bracketed {
    type Output = Result<(), MachineError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let _guard = stack::enter(&this.machine);
        this.inner.as_mut().poll(cx)
    }
}
