use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use service_supervisor::{Cancelled, HostedService, ServiceResult};
use tokio_util::sync::CancellationToken;

/// How many times each lifecycle operation was called.
#[derive(Clone, Default)]
pub struct Calls {
    pub starts: Arc<AtomicUsize>,
    pub restarts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

#[allow(unused)]
impl Calls {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[allow(unused)]
#[derive(Clone)]
pub enum StopBehavior {
    Succeed,
    Fail(&'static str),
    Panic(&'static str),
    Cancelled,
}

/// A service whose `start` blocks until `stop` is called, unless configured
/// to exit on its own.
#[derive(Clone)]
pub struct MockService {
    pub calls: Calls,
    released: CancellationToken,
    exit_after: Option<Duration>,
    exit_error: Option<&'static str>,
    restart_error: Option<&'static str>,
    stop_behavior: StopBehavior,
}

#[allow(unused)]
impl MockService {
    pub fn new() -> Self {
        Self {
            calls: Calls::default(),
            released: CancellationToken::new(),
            exit_after: None,
            exit_error: None,
            restart_error: None,
            stop_behavior: StopBehavior::Succeed,
        }
    }

    /// Makes `start` return on its own after `delay`, failing with `error`.
    pub fn exiting_after(mut self, delay: Duration, error: &'static str) -> Self {
        self.exit_after = Some(delay);
        self.exit_error = Some(error);
        self
    }

    /// Makes `start` return `Ok(())` on its own after `delay`.
    pub fn completing_after(mut self, delay: Duration) -> Self {
        self.exit_after = Some(delay);
        self.exit_error = None;
        self
    }

    pub fn failing_restart(mut self, error: &'static str) -> Self {
        self.restart_error = Some(error);
        self
    }

    pub fn with_stop(mut self, behavior: StopBehavior) -> Self {
        self.stop_behavior = behavior;
        self
    }
}

#[async_trait]
impl HostedService for MockService {
    async fn start(&self, _ctx: CancellationToken) -> ServiceResult {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        match self.exit_after {
            Some(delay) => {
                tokio::select! {
                    _ = self.released.cancelled() => Ok(()),
                    _ = tokio::time::sleep(delay) => match self.exit_error {
                        Some(error) => Err(anyhow!(error)),
                        None => Ok(()),
                    },
                }
            }
            None => {
                self.released.cancelled().await;
                Ok(())
            }
        }
    }

    async fn restart(&self, _ctx: CancellationToken) -> ServiceResult {
        self.calls.restarts.fetch_add(1, Ordering::SeqCst);
        match self.restart_error {
            Some(error) => Err(anyhow!(error)),
            None => Ok(()),
        }
    }

    async fn stop(&self, _ctx: CancellationToken) -> ServiceResult {
        self.calls.stops.fetch_add(1, Ordering::SeqCst);
        self.released.cancel();
        match self.stop_behavior {
            StopBehavior::Succeed => Ok(()),
            StopBehavior::Fail(error) => Err(anyhow!(error)),
            StopBehavior::Panic(payload) => panic!("{}", payload),
            StopBehavior::Cancelled => Err(Cancelled.into()),
        }
    }
}

/// Polls `condition` until it holds, giving up after `limit`.
#[allow(unused)]
pub async fn wait_until(limit: Duration, condition: impl Fn() -> bool) -> bool {
    tokio::time::timeout(limit, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}
