pub(crate) mod aggregate;
pub(crate) mod builder;
pub(crate) mod handle;

use std::{fmt, sync::Arc, time::Duration};

use tokio::{signal::unix::SignalKind, sync::mpsc};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    error::{ServiceFailure, SupervisorError},
    gate::{BroadcastWaiter, OneShotGate, RepeatingBroadcast},
    log,
    service::{guard::contain, is_cancellation, Phase},
    signals::{Purpose, SignalSource},
    supervisor::{
        aggregate::{ErrorAggregate, FailureRecorder},
        handle::{SupervisorHandle, SupervisorMessage},
    },
    HostedService, ServiceName,
};

/// Why a run moved into shutdown. Only the first trigger is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownCause {
    /// The caller's cancellation token was cancelled.
    Cancelled,
    /// A configured shutdown signal arrived.
    Signal(SignalKind),
    /// A service's `start` returned without being asked to stop.
    SpontaneousExit(ServiceName),
    /// `SupervisorHandle::shutdown` was called.
    Requested,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::Signal(kind) => write!(f, "signal {}", kind.as_raw_value()),
            Self::SpontaneousExit(name) => write!(f, "service `{name}` exited"),
            Self::Requested => write!(f, "shutdown requested"),
        }
    }
}

/// Runs a set of hosted services and coordinates their shutdown and restarts.
///
/// A run starts every service at once, fans restart signals out to all of
/// them, and stops all of them as soon as the caller cancels, a shutdown
/// signal arrives, or one service exits on its own. Every failure along the
/// way is collected and reported together when the run ends.
pub struct Supervisor {
    services: Vec<(ServiceName, Arc<dyn HostedService>)>,
    signals: SignalSource,
    restart_backlog: usize,
    exit_grace_period: Duration,
    shutdown: OneShotGate<ShutdownCause>,
    tx: mpsc::UnboundedSender<SupervisorMessage>,
    rx: mpsc::UnboundedReceiver<SupervisorMessage>,
}

impl Supervisor {
    /// Returns a handle that can restart or shut down the run from outside.
    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle::new(self.tx.clone(), self.shutdown.clone())
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Runs every service until the run is shut down, consuming the supervisor.
    ///
    /// Resolves once every `stop` has returned and, unless a service exited on
    /// its own, every `start` as well. Returns `Ok(())` when nothing failed.
    pub async fn run(self, ctx: CancellationToken) -> Result<(), SupervisorError> {
        let Self {
            services,
            signals,
            restart_backlog,
            exit_grace_period,
            shutdown,
            tx,
            mut rx,
        } = self;
        drop(tx);

        let mut shutdown_signals = signals.listen(Purpose::Shutdown)?;
        let mut restart_signals = signals.listen(Purpose::Restart)?;

        let spontaneous = OneShotGate::<ServiceName>::new();
        let restarts = RepeatingBroadcast::with_backlog(restart_backlog);
        let aggregate = ErrorAggregate::new();
        let exited = TaskTracker::new();
        let stopped = TaskTracker::new();

        log::info!(services = services.len(), "starting supervision run");
        for (name, service) in services {
            exited.spawn(run_start(
                name.clone(),
                Arc::clone(&service),
                ctx.clone(),
                shutdown.clone(),
                spontaneous.clone(),
                aggregate.recorder(),
            ));
            tokio::spawn(wait_restarts(
                name.clone(),
                Arc::clone(&service),
                ctx.clone(),
                restarts.subscribe(),
                aggregate.recorder(),
            ));
            stopped.spawn(wait_stop(
                name,
                service,
                ctx.clone(),
                shutdown.clone(),
                aggregate.recorder(),
            ));
        }
        exited.close();
        stopped.close();

        let mut commands_open = true;
        let cause = loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => break ShutdownCause::Cancelled,
                name = spontaneous.fired() => break ShutdownCause::SpontaneousExit(name),
                kind = shutdown_signals.recv() => break ShutdownCause::Signal(kind),
                kind = restart_signals.recv() => {
                    log::info!(signal = kind.as_raw_value(), "restart signal received");
                    restarts.fire();
                }
                message = rx.recv(), if commands_open => match message {
                    Some(SupervisorMessage::Restart) => {
                        log::info!("restart requested");
                        restarts.fire();
                    }
                    Some(SupervisorMessage::Shutdown) => break ShutdownCause::Requested,
                    None => commands_open = false,
                },
            }
        };
        drop(rx);

        if shutdown.fire(cause.clone()) {
            log::info!(%cause, "shutting down services");
        }

        stopped.wait().await;
        match cause {
            ShutdownCause::SpontaneousExit(_) => {
                if tokio::time::timeout(exit_grace_period, exited.wait())
                    .await
                    .is_err()
                {
                    log::warning!(
                        still_running = exited.len(),
                        "services did not exit within the grace period"
                    );
                }
            }
            _ => exited.wait().await,
        }
        drop(restarts);

        let result = aggregate.finish();
        match &result {
            Ok(()) => log::info!("supervision run finished"),
            Err(failures) => log::error!(failures = failures.len(), "supervision run finished with failures"),
        }
        result.map_err(SupervisorError::from)
    }
}

/// Runs `start` for one service and reports an unrequested return.
async fn run_start(
    name: ServiceName,
    service: Arc<dyn HostedService>,
    ctx: CancellationToken,
    shutdown: OneShotGate<ShutdownCause>,
    spontaneous: OneShotGate<ServiceName>,
    recorder: FailureRecorder,
) {
    log::debug!(service = %name, "starting service");
    let result = contain(&name, Phase::Start, service.start(ctx.clone())).await;
    let requested = shutdown.is_fired() || ctx.is_cancelled();
    recorder.record_result(result);
    if !requested && spontaneous.fire(name.clone()) {
        log::warning!(service = %name, "service exited on its own");
    }
}

/// Calls `restart` once per firing until the run drops the broadcast.
async fn wait_restarts(
    name: ServiceName,
    service: Arc<dyn HostedService>,
    ctx: CancellationToken,
    mut waiter: BroadcastWaiter,
    recorder: FailureRecorder,
) {
    while let Some(firings) = waiter.next().await {
        if firings > 1 {
            log::warning!(service = %name, firings, "service fell behind on restarts");
        }
        for _ in 0..firings {
            log::debug!(service = %name, "restarting service");
            recorder.record_result(contain(&name, Phase::Restart, service.restart(ctx.clone())).await);
        }
    }
}

/// Calls `stop` once the shutdown gate fires.
async fn wait_stop(
    name: ServiceName,
    service: Arc<dyn HostedService>,
    ctx: CancellationToken,
    shutdown: OneShotGate<ShutdownCause>,
    recorder: FailureRecorder,
) {
    shutdown.fired().await;
    log::debug!(service = %name, "stopping service");
    match contain(&name, Phase::Stop, service.stop(ctx.clone())).await {
        Err(ServiceFailure::Failed { error, .. })
            if ctx.is_cancelled() && is_cancellation(&error) =>
        {
            log::debug!(service = %name, "stop abandoned after cancellation");
        }
        result => recorder.record_result(result),
    }
}
