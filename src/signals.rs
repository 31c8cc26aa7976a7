//! OS signal delivery as subscribable event streams.
//!
//! A [`SignalSource`] holds which signals mean "shut down" and which mean
//! "restart". Every subscription registers its own listeners, so several
//! subscribers of the same signal each get their own delivery.
//!
//! Defaults:
//! - shutdown: `SIGINT`, `SIGTERM`
//! - restart: `SIGHUP`

use tokio::{
    signal::unix::{signal, SignalKind},
    sync::mpsc,
};

use crate::{error::SupervisorError, log};

/// Default per-stream buffer. One slot is enough to keep the first signal
/// that arrives before anyone is waiting.
pub const DEFAULT_SIGNAL_CAPACITY: usize = 1;

/// What a group of signals asks the supervisor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Shutdown,
    Restart,
}

#[derive(Debug, Clone)]
pub struct SignalSource {
    shutdown: Vec<SignalKind>,
    restart: Vec<SignalKind>,
    capacity: usize,
}

impl SignalSource {
    /// A source with the default shutdown and restart signals.
    pub fn new() -> Self {
        Self {
            shutdown: vec![SignalKind::interrupt(), SignalKind::terminate()],
            restart: vec![SignalKind::hangup()],
            capacity: DEFAULT_SIGNAL_CAPACITY,
        }
    }

    /// A source that listens to nothing. Only cancellation ends a run.
    pub fn none() -> Self {
        Self {
            shutdown: Vec::new(),
            restart: Vec::new(),
            capacity: DEFAULT_SIGNAL_CAPACITY,
        }
    }

    pub fn with_shutdown_signals(mut self, kinds: impl IntoIterator<Item = SignalKind>) -> Self {
        self.shutdown = kinds.into_iter().collect();
        self
    }

    pub fn with_restart_signals(mut self, kinds: impl IntoIterator<Item = SignalKind>) -> Self {
        self.restart = kinds.into_iter().collect();
        self
    }

    /// Sets the buffer size of every stream created afterwards. Clamped to 1.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn kinds(&self, purpose: Purpose) -> &[SignalKind] {
        match purpose {
            Purpose::Shutdown => &self.shutdown,
            Purpose::Restart => &self.restart,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Subscribes to the signals configured for `purpose`.
    pub fn listen(&self, purpose: Purpose) -> Result<SignalStream, SupervisorError> {
        self.subscribe(self.kinds(purpose))
    }

    /// Registers interest in `kinds` and returns a stream of their deliveries.
    ///
    /// An empty `kinds` yields a stream that never produces an event. Must be
    /// called from within a Tokio runtime.
    pub fn subscribe(&self, kinds: &[SignalKind]) -> Result<SignalStream, SupervisorError> {
        let (tx, rx) = mpsc::channel(self.capacity);
        for &kind in kinds {
            let mut listener =
                signal(kind).map_err(|source| SupervisorError::SignalRegistration {
                    signal: kind.as_raw_value(),
                    source,
                })?;
            let tx = tx.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tx.closed() => break,
                        received = listener.recv() => {
                            if received.is_none() {
                                break;
                            }
                            match tx.try_send(kind) {
                                Ok(()) => {}
                                Err(mpsc::error::TrySendError::Full(_)) => {
                                    log::debug!(signal = kind.as_raw_value(), "signal stream full, dropping delivery");
                                }
                                Err(mpsc::error::TrySendError::Closed(_)) => break,
                            }
                        }
                    }
                }
            });
        }
        Ok(SignalStream { rx })
    }
}

impl Default for SignalSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Deliveries for one subscription.
#[derive(Debug)]
pub struct SignalStream {
    rx: mpsc::Receiver<SignalKind>,
}

impl SignalStream {
    /// Waits for the next delivered signal. Never resolves for a stream
    /// subscribed to no signals.
    pub async fn recv(&mut self) -> SignalKind {
        match self.rx.recv().await {
            Some(kind) => kind,
            None => std::future::pending().await,
        }
    }
}
