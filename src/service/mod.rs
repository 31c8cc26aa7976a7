pub(crate) mod guard;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub type ServiceError = anyhow::Error;

pub type ServiceResult = Result<(), ServiceError>;

/// The trait users implement for services managed by the supervisor.
///
/// One instance is shared between the three tasks the supervisor spawns for
/// it (start, restart and stop), so every operation takes `&self`. Use interior
/// mutability (`Mutex`, atomics, channels) for state that `stop` or `restart`
/// needs to reach inside a running `start`.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use service_supervisor::{HostedService, ServiceResult};
/// use tokio_util::sync::CancellationToken;
///
/// struct Ticker {
///     stop: CancellationToken,
/// }
///
/// #[async_trait]
/// impl HostedService for Ticker {
///     async fn start(&self, _ctx: CancellationToken) -> ServiceResult {
///         self.stop.cancelled().await;
///         Ok(())
///     }
///
///     async fn restart(&self, _ctx: CancellationToken) -> ServiceResult {
///         Ok(())
///     }
///
///     async fn stop(&self, _ctx: CancellationToken) -> ServiceResult {
///         // Safe to call after `start` already returned.
///         self.stop.cancel();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait HostedService: Send + Sync + 'static {
    /// Runs the service for its whole active lifetime.
    ///
    /// Returns `Ok(())` after a requested stop and `Err` when the service
    /// failed or terminated on its own.
    async fn start(&self, ctx: CancellationToken) -> ServiceResult;

    /// Reacts to one restart firing. Must finish in bounded time.
    async fn restart(&self, ctx: CancellationToken) -> ServiceResult;

    /// Asks the service to terminate, making a running `start` return.
    ///
    /// Must be a no-op when the service has already terminated.
    async fn stop(&self, ctx: CancellationToken) -> ServiceResult;
}

/// Returned by a service when an operation was abandoned because the
/// cancellation token was already done.
///
/// Stop failures carrying this error are not reported when the caller's token
/// is cancelled; any other stop failing with it is still reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// The lifecycle operation a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Restart,
    Stop,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Restart => write!(f, "restart"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

pub(crate) fn is_cancellation(error: &ServiceError) -> bool {
    error.downcast_ref::<Cancelled>().is_some()
}
