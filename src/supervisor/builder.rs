use std::{sync::Arc, time::Duration};

use tokio::{signal::unix::SignalKind, sync::mpsc};

use crate::{
    gate::{OneShotGate, DEFAULT_BROADCAST_BACKLOG}, signals::SignalSource, HostedService, ServiceName,
    Supervisor,
};

/// Builds a `Supervisor` instance with configurable parameters.
///
/// Allows customization of the hosted services, the signals that trigger
/// shutdown and restart, and how long a run waits for stragglers.
pub struct SupervisorBuilder {
    services: Vec<(ServiceName, Arc<dyn HostedService>)>,
    signals: SignalSource,
    restart_backlog: usize,
    exit_grace_period: Duration,
}

impl SupervisorBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            signals: SignalSource::new(),
            restart_backlog: DEFAULT_BROADCAST_BACKLOG,
            exit_grace_period: Duration::from_secs(5),
        }
    }

    /// Adds a service to the supervisor with the specified name.
    pub fn with_service(self, name: &str, service: impl HostedService) -> Self {
        self.with_shared_service(name, Arc::new(service))
    }

    /// Adds a service that is already shared elsewhere.
    pub fn with_shared_service(mut self, name: &str, service: Arc<dyn HostedService>) -> Self {
        self.services.push((name.into(), service));
        self
    }

    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = (ServiceName, S)>,
        S: HostedService,
    {
        for (name, service) in services {
            self = self.with_service(&name, service);
        }
        self
    }

    /// Replaces the whole signal configuration.
    pub fn with_signals(mut self, signals: SignalSource) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_shutdown_signals(mut self, kinds: impl IntoIterator<Item = SignalKind>) -> Self {
        self.signals = self.signals.with_shutdown_signals(kinds);
        self
    }

    pub fn with_restart_signals(mut self, kinds: impl IntoIterator<Item = SignalKind>) -> Self {
        self.signals = self.signals.with_restart_signals(kinds);
        self
    }

    /// Sets the buffer size of each signal stream.
    pub fn with_signal_capacity(mut self, capacity: usize) -> Self {
        self.signals = self.signals.with_capacity(capacity);
        self
    }

    /// Sets how many restart firings a busy service may fall behind by before
    /// the missed ones are replayed in a batch.
    pub fn with_restart_backlog(mut self, backlog: usize) -> Self {
        self.restart_backlog = backlog;
        self
    }

    /// Sets how long a run ended by a spontaneous exit waits for the other
    /// services' `start` calls after every `stop` returned.
    pub fn with_exit_grace_period(mut self, period: Duration) -> Self {
        self.exit_grace_period = period;
        self
    }

    /// Constructs the `Supervisor` with the configured settings.
    pub fn build(self) -> Supervisor {
        let (tx, rx) = mpsc::unbounded_channel();
        Supervisor {
            services: self.services,
            signals: self.signals,
            restart_backlog: self.restart_backlog,
            exit_grace_period: self.exit_grace_period,
            shutdown: OneShotGate::new(),
            tx,
            rx,
        }
    }
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
