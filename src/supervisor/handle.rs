use thiserror::Error;
use tokio::sync::mpsc;

use crate::{gate::OneShotGate, ShutdownCause};

/// Commands accepted by a running supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SupervisorMessage {
    /// Fire the restart broadcast, as a restart signal would.
    Restart,
    /// Begin shutdown, as a shutdown signal would.
    Shutdown,
}

#[derive(Debug, Error)]
pub enum SupervisorHandleError {
    #[error("failed to send message to supervisor: the run has finished")]
    SendError,
}

/// Controls a supervision run from outside, alongside OS signals.
///
/// Messages sent before the run starts are processed as soon as it does.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    tx: mpsc::UnboundedSender<SupervisorMessage>,
    shutdown: OneShotGate<ShutdownCause>,
}

impl SupervisorHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<SupervisorMessage>,
        shutdown: OneShotGate<ShutdownCause>,
    ) -> Self {
        Self { tx, shutdown }
    }

    /// Asks every hosted service to restart once.
    pub fn restart(&self) -> Result<(), SupervisorHandleError> {
        self.send(SupervisorMessage::Restart)
    }

    /// Asks the supervisor to stop every hosted service and finish the run.
    pub fn shutdown(&self) -> Result<(), SupervisorHandleError> {
        self.send(SupervisorMessage::Shutdown)
    }

    fn send(&self, message: SupervisorMessage) -> Result<(), SupervisorHandleError> {
        self.tx
            .send(message)
            .map_err(|_| SupervisorHandleError::SendError)
    }

    /// The trigger that moved the run into shutdown, once one has.
    pub fn shutdown_cause(&self) -> Option<ShutdownCause> {
        self.shutdown.value()
    }

    /// Waits until the run starts shutting down and returns why.
    pub async fn shutting_down(&self) -> ShutdownCause {
        self.shutdown.fired().await
    }

    /// Whether the run this handle belongs to has finished.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
