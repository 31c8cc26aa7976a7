use std::fmt;

use thiserror::Error;

use crate::{service::Phase, ServiceError, ServiceName};

/// A single failure recorded during a supervision run.
#[derive(Debug, Error)]
pub enum ServiceFailure {
    /// A lifecycle operation returned an error.
    #[error("service `{service}` failed to {phase}: {error:#}")]
    Failed {
        service: ServiceName,
        phase: Phase,
        error: ServiceError,
    },
    /// A lifecycle operation panicked; the payload was recovered as text.
    #[error("service `{service}` panicked during {phase}: {message}")]
    Panicked {
        service: ServiceName,
        phase: Phase,
        message: String,
    },
}

impl ServiceFailure {
    pub fn service(&self) -> &str {
        match self {
            Self::Failed { service, .. } | Self::Panicked { service, .. } => service,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::Failed { phase, .. } | Self::Panicked { phase, .. } => *phase,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }
}

/// Every failure of one run, in the order they were recorded.
#[derive(Debug)]
pub struct AggregateError {
    failures: Vec<ServiceFailure>,
}

impl AggregateError {
    pub(crate) fn new(failures: Vec<ServiceFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[ServiceFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<ServiceFailure> {
        self.failures
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.as_slice() {
            [single] => write!(f, "{single}"),
            failures => {
                write!(f, "{} service failures", failures.len())?;
                for (i, failure) in failures.iter().enumerate() {
                    write!(f, "; [{}] {failure}", i + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AggregateError {}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Services(#[from] AggregateError),
    #[error("failed to register handler for signal {signal}: {source}")]
    SignalRegistration {
        signal: i32,
        #[source]
        source: std::io::Error,
    },
}

impl SupervisorError {
    /// The recorded service failures, if the run got far enough to collect any.
    pub fn failures(&self) -> &[ServiceFailure] {
        match self {
            Self::Services(aggregate) => aggregate.failures(),
            Self::SignalRegistration { .. } => &[],
        }
    }
}
