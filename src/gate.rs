//! Synchronization points used to fan lifecycle transitions out to tasks.
//!
//! [`OneShotGate`] fires once and stays fired; [`RepeatingBroadcast`] fires any
//! number of times and every registered waiter sees every firing.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

/// Fires at most once, carrying the value of the first firing.
///
/// Every waiter, including ones that start waiting after the firing, observes
/// that value. Later `fire` calls are absorbed and return `false`.
#[derive(Debug)]
pub struct OneShotGate<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for OneShotGate<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone> OneShotGate<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Fires the gate. Returns `true` only for the call that actually fired it.
    pub fn fire(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(value);
            true
        })
    }

    pub fn is_fired(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The value of the firing, if the gate has fired.
    pub fn value(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Waits until the gate fires and returns the value it fired with.
    pub async fn fired(&self) -> T {
        let mut rx = self.tx.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(value) = current {
                return value;
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

impl<T: Clone> Default for OneShotGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Default number of firings a waiter may fall behind before it lags.
pub const DEFAULT_BROADCAST_BACKLOG: usize = 16;

/// Fires any number of times; each firing reaches every registered waiter.
#[derive(Debug, Clone)]
pub struct RepeatingBroadcast {
    tx: broadcast::Sender<()>,
}

impl RepeatingBroadcast {
    pub fn new() -> Self {
        Self::with_backlog(DEFAULT_BROADCAST_BACKLOG)
    }

    pub fn with_backlog(backlog: usize) -> Self {
        let (tx, _) = broadcast::channel(backlog.max(1));
        Self { tx }
    }

    /// Registers a waiter. It observes every firing made after this call.
    pub fn subscribe(&self) -> BroadcastWaiter {
        BroadcastWaiter {
            rx: self.tx.subscribe(),
        }
    }

    /// Fires once and returns how many waiters were registered.
    pub fn fire(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn waiter_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for RepeatingBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

/// One waiter's view of a [`RepeatingBroadcast`].
#[derive(Debug)]
pub struct BroadcastWaiter {
    rx: broadcast::Receiver<()>,
}

impl BroadcastWaiter {
    /// Waits for the next firing.
    ///
    /// Returns how many firings to act on: normally 1, more when the waiter fell
    /// behind the backlog and older firings were overwritten. Returns `None`
    /// once every [`RepeatingBroadcast`] handle has been dropped.
    pub async fn next(&mut self) -> Option<u64> {
        match self.rx.recv().await {
            Ok(()) => Some(1),
            Err(broadcast::error::RecvError::Lagged(missed)) => Some(missed),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}
