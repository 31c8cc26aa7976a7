use std::{
    process::ExitCode,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use service_supervisor::{HostedService, ServiceResult, SupervisorBuilder};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Prints a line every second until stopped; `SIGHUP` bumps its generation.
struct Ticker {
    emoji: char,
    generation: AtomicU64,
    stop: CancellationToken,
}

impl Ticker {
    fn new(emoji: char) -> Self {
        Self {
            emoji,
            generation: AtomicU64::new(0),
            stop: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl HostedService for Ticker {
    async fn start(&self, _ctx: CancellationToken) -> ServiceResult {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = self.stop.cancelled() => return Ok(()),
                _ = interval.tick() => {
                    let generation = self.generation.load(Ordering::SeqCst);
                    println!("{} tick (generation {generation})", self.emoji);
                }
            }
        }
    }

    async fn restart(&self, _ctx: CancellationToken) -> ServiceResult {
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> ServiceResult {
        self.stop.cancel();
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Default signals: SIGINT/SIGTERM shut down, SIGHUP restarts.
    let supervisor = SupervisorBuilder::default()
        .with_service("ticker-a", Ticker::new('🥴'))
        .with_service("ticker-b", Ticker::new('🧑'))
        .build();

    match supervisor.run(CancellationToken::new()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("supervisor failed: {error}");
            ExitCode::FAILURE
        }
    }
}
