//! Completion slots for permutations compiled off the lookup path.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{CacheError, CodegenFailure};

#[derive(Clone, Debug)]
pub enum CompileStatus<M> {
    Pending,
    Ready(M),
    Failed(CodegenFailure),
    Cancelled,
}

impl<M: Clone> CompileStatus<M> {
    fn outcome(&self) -> Option<Result<M, CacheError>> {
        match self {
            Self::Pending => None,
            Self::Ready(module) => Some(Ok(module.clone())),
            Self::Failed(err) => Some(Err(CacheError::Codegen(err.clone()))),
            Self::Cancelled => Some(Err(CacheError::Cancelled)),
        }
    }
}

struct TicketState<M> {
    status: Mutex<CompileStatus<M>>,
    done: Condvar,
}

/// Shared handle to a compile in flight. Every lookup that misses on the same permutation
/// while it compiles receives a clone of the same ticket.
pub struct CompileTicket<M> {
    state: Arc<TicketState<M>>,
}

impl<M> Clone for CompileTicket<M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<M> fmt::Debug for CompileTicket<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileTicket")
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl<M> Default for CompileTicket<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> CompileTicket<M> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(TicketState {
                status: Mutex::new(CompileStatus::Pending),
                done: Condvar::new(),
            }),
        }
    }

    // A panicking backend must not wedge every other waiter, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, CompileStatus<M>> {
        self.state
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.lock(), CompileStatus::Pending)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.lock(), CompileStatus::Cancelled)
    }

    pub fn same_ticket(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Cancels a pending compile. Returns `false` if it had already finished.
    pub fn cancel(&self) -> bool {
        self.resolve(CompileStatus::Cancelled)
    }

    /// Publishes the compile result. Returns `false` if the ticket was cancelled first.
    pub(crate) fn complete(&self, result: Result<M, CodegenFailure>) -> bool {
        self.resolve(match result {
            Ok(module) => CompileStatus::Ready(module),
            Err(err) => CompileStatus::Failed(err),
        })
    }

    fn resolve(&self, status: CompileStatus<M>) -> bool {
        let mut guard = self.lock();
        if !matches!(*guard, CompileStatus::Pending) {
            return false;
        }
        *guard = status;
        drop(guard);
        self.state.done.notify_all();
        true
    }
}

impl<M: Clone> CompileTicket<M> {
    /// The outcome, or `None` while the compile is still running.
    pub fn poll(&self) -> Option<Result<M, CacheError>> {
        self.lock().outcome()
    }

    pub fn wait(&self) -> Result<M, CacheError> {
        let mut guard = self.lock();
        loop {
            if let Some(outcome) = guard.outcome() {
                return outcome;
            }
            guard = self
                .state
                .done
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`, returning `None`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<M, CacheError>> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if let Some(outcome) = guard.outcome() {
                return Some(outcome);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            if remaining.is_zero() {
                return None;
            }
            guard = self
                .state
                .done
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}
