//! # service-supervisor
//!
//! `service-supervisor` runs a set of long-running services side by side and
//! takes care of the awkward part: stopping all of them, exactly once, when
//! it is time to go.
//!
//! A run ends when the first of these happens:
//!
//! * the caller cancels the `CancellationToken` passed to [`Supervisor::run`],
//! * a shutdown signal arrives (`SIGINT`/`SIGTERM` by default),
//! * any service's `start` returns on its own,
//! * [`SupervisorHandle::shutdown`] is called.
//!
//! Restart signals (`SIGHUP` by default) call `restart` on **every** service,
//! as many times as they arrive, without ending the run.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use service_supervisor::{HostedService, ServiceResult, SupervisorBuilder};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Server {
//!     stop: CancellationToken,
//! }
//!
//! #[async_trait]
//! impl HostedService for Server {
//!     async fn start(&self, _ctx: CancellationToken) -> ServiceResult {
//!         self.stop.cancelled().await;
//!         Ok(())
//!     }
//!
//!     async fn restart(&self, _ctx: CancellationToken) -> ServiceResult {
//!         println!("reloading");
//!         Ok(())
//!     }
//!
//!     async fn stop(&self, _ctx: CancellationToken) -> ServiceResult {
//!         self.stop.cancel();
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let supervisor = SupervisorBuilder::default()
//!         .with_service("server", Server { stop: CancellationToken::new() })
//!         .build();
//!
//!     supervisor.run(CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API overview
//!
//! | Item                                | Purpose                                                   |
//! | ----------------------------------- | --------------------------------------------------------- |
//! | `SupervisorBuilder::with_service`   | Register a hosted service                                 |
//! | `SupervisorBuilder::with_signals`   | Choose which OS signals shut down or restart the services |
//! | `Supervisor::handle`                | Get a `SupervisorHandle` to restart or shut down remotely |
//! | `Supervisor::run(ctx).await`        | Run until shutdown; returns every failure at once         |
//! | `OneShotGate` / `RepeatingBroadcast`| The primitives the run is built on                        |
//!
//! Failures from `start`, `restart` and `stop`, including panics, never stop
//! the run from completing; they are returned together as an
//! [`AggregateError`].

#![cfg_attr(not(feature = "with_tracing"), allow(unused_variables))]

pub use error::{AggregateError, ServiceFailure, SupervisorError};
pub use gate::{BroadcastWaiter, OneShotGate, RepeatingBroadcast};
pub use service::{Cancelled, HostedService, Phase, ServiceError, ServiceResult};
pub use signals::{Purpose, SignalSource, SignalStream};
pub use supervisor::{
    builder::SupervisorBuilder,
    handle::{SupervisorHandle, SupervisorHandleError},
    ShutdownCause, Supervisor,
};
pub use tokio::signal::unix::SignalKind;

mod error;
mod gate;
mod log;
mod service;
mod signals;
mod supervisor;

pub type ServiceName = String;
