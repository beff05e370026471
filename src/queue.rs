// Pending-waiters queue
// Parks callers until one shared result is available, then settles them FIFO

use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;

/// Why a parked waiter did not receive a value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaitError<E> {
    /// The queue was rejected with this error
    #[error("{0}")]
    Rejected(E),

    /// The waiter was dropped from the queue without being settled
    #[error("waiter dropped before the shared result was available")]
    Dropped,
}

/// FIFO list of pending continuations sharing one result
pub struct WaiterQueue<T, E> {
    waiters: VecDeque<oneshot::Sender<Result<T, E>>>,
}

impl<T, E> Default for WaiterQueue<T, E> {
    fn default() -> Self {
        Self {
            waiters: VecDeque::new(),
        }
    }
}

impl<T: Clone, E: Clone> WaiterQueue<T, E> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter and return the future that completes when the queue settles
    pub fn enqueue(&mut self) -> Waiter<T, E> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(tx);
        Waiter { rx }
    }

    /// Fulfil every registered waiter with `value`, oldest first, then clear
    pub fn resolve_all(&mut self, value: T) {
        for tx in self.waiters.drain(..) {
            // A closed receiver means the caller stopped waiting
            let _ = tx.send(Ok(value.clone()));
        }
    }

    /// Fail every registered waiter with `error`, oldest first, then clear
    pub fn reject_all(&mut self, error: E) {
        for tx in self.waiters.drain(..) {
            let _ = tx.send(Err(error.clone()));
        }
    }

    /// Drop all waiters without settling them
    pub fn clear(&mut self) {
        self.waiters.clear();
    }

    /// Number of parked waiters
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

/// Handle returned by [`WaiterQueue::enqueue`]
#[must_use = "a waiter does nothing unless awaited"]
pub struct Waiter<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for Waiter<T, E> {
    type Output = Result<T, WaitError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.rx.poll_unpin(cx).map(|received| match received {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(WaitError::Rejected(error)),
            Err(_) => Err(WaitError::Dropped),
        })
    }
}
