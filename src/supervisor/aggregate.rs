use tokio::sync::mpsc;

use crate::{
    error::{AggregateError, ServiceFailure},
    log,
};

/// Collects failures from every task of a run through one ingestion channel.
pub(crate) struct ErrorAggregate {
    tx: mpsc::UnboundedSender<ServiceFailure>,
    rx: mpsc::UnboundedReceiver<ServiceFailure>,
}

impl ErrorAggregate {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub(crate) fn recorder(&self) -> FailureRecorder {
        FailureRecorder {
            tx: self.tx.clone(),
        }
    }

    /// Drains everything recorded so far. Call only once the run has quiesced.
    pub(crate) fn finish(mut self) -> Result<(), AggregateError> {
        let mut failures = Vec::new();
        while let Ok(failure) = self.rx.try_recv() {
            failures.push(failure);
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateError::new(failures))
        }
    }
}

#[derive(Clone)]
pub(crate) struct FailureRecorder {
    tx: mpsc::UnboundedSender<ServiceFailure>,
}

impl FailureRecorder {
    pub(crate) fn record(&self, failure: ServiceFailure) {
        log::warning!(service = failure.service(), phase = %failure.phase(), error = %failure, "service failure recorded");
        // The aggregate is gone once the run returned; late failures have nowhere to go.
        let _ = self.tx.send(failure);
    }

    pub(crate) fn record_result(&self, result: Result<(), ServiceFailure>) {
        if let Err(failure) = result {
            self.record(failure);
        }
    }
}
