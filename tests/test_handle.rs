mod common;

use std::time::Duration;

use tokio::time::{pause, timeout};
use tokio_util::sync::CancellationToken;

use service_supervisor::{
    ShutdownCause, SignalSource, SupervisorBuilder, SupervisorHandleError,
};

use common::{wait_until, MockService};

#[tokio::test]
async fn test_handle_fails_after_run_ends() {
    pause();
    let supervisor = SupervisorBuilder::new()
        .with_signals(SignalSource::none())
        .with_service("service", MockService::new())
        .build();
    let handle = supervisor.handle();
    assert!(!handle.is_closed());

    let ctx = CancellationToken::new();
    ctx.cancel();
    timeout(Duration::from_secs(1), supervisor.run(ctx))
        .await
        .unwrap()
        .unwrap();

    assert!(handle.is_closed());
    assert!(matches!(handle.restart(), Err(SupervisorHandleError::SendError)));
    assert!(matches!(handle.shutdown(), Err(SupervisorHandleError::SendError)));
}

#[tokio::test]
async fn test_cloned_handles_share_the_run() {
    pause();
    let service = MockService::new();
    let supervisor = SupervisorBuilder::new()
        .with_signals(SignalSource::none())
        .with_service("service", service.clone())
        .build();
    let handle = supervisor.handle();
    let clone = handle.clone();
    drop(handle);

    let run = tokio::spawn(supervisor.run(CancellationToken::new()));
    clone.restart().unwrap();
    clone.shutdown().unwrap();

    timeout(Duration::from_secs(5), run).await.unwrap().unwrap().unwrap();
    assert_eq!(service.calls.stops(), 1);
}

#[tokio::test]
async fn test_run_continues_when_every_handle_is_dropped() {
    pause();
    let service = MockService::new();
    let supervisor = SupervisorBuilder::new()
        .with_signals(SignalSource::none())
        .with_service("service", service.clone())
        .build();
    drop(supervisor.handle());

    let ctx = CancellationToken::new();
    let run = tokio::spawn(supervisor.run(ctx.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!run.is_finished());

    ctx.cancel();
    timeout(Duration::from_secs(5), run).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_cause_requested() {
    pause();
    let supervisor = SupervisorBuilder::new()
        .with_signals(SignalSource::none())
        .with_service("service", MockService::new())
        .build();
    let handle = supervisor.handle();
    assert_eq!(handle.shutdown_cause(), None);

    handle.shutdown().unwrap();
    let ctx = CancellationToken::new();
    timeout(Duration::from_secs(5), supervisor.run(ctx.clone()))
        .await
        .unwrap()
        .unwrap();
    // Cancelling afterwards does not change the recorded trigger.
    ctx.cancel();
    assert_eq!(handle.shutdown_cause(), Some(ShutdownCause::Requested));
}

#[tokio::test]
async fn test_shutdown_cause_cancelled() {
    pause();
    let service = MockService::new();
    let supervisor = SupervisorBuilder::new()
        .with_signals(SignalSource::none())
        .with_service("service", service.clone())
        .build();
    let handle = supervisor.handle();

    let ctx = CancellationToken::new();
    let run = tokio::spawn(supervisor.run(ctx.clone()));
    assert!(wait_until(Duration::from_secs(1), || service.calls.starts() == 1).await);
    ctx.cancel();

    let cause = timeout(Duration::from_secs(5), handle.shutting_down())
        .await
        .unwrap();
    assert_eq!(cause, ShutdownCause::Cancelled);
    timeout(Duration::from_secs(5), run).await.unwrap().unwrap().unwrap();
    let _ = handle.shutdown();
    assert_eq!(handle.shutdown_cause(), Some(ShutdownCause::Cancelled));
}

#[tokio::test]
async fn test_shutdown_cause_spontaneous_exit() {
    pause();
    let supervisor = SupervisorBuilder::new()
        .with_signals(SignalSource::none())
        .with_service("steady", MockService::new())
        .with_service(
            "crashing",
            MockService::new().exiting_after(Duration::from_millis(20), "crashed"),
        )
        .build();
    let handle = supervisor.handle();

    let result = timeout(Duration::from_secs(5), supervisor.run(CancellationToken::new()))
        .await
        .unwrap();
    assert!(result.is_err());
    assert_eq!(
        handle.shutdown_cause(),
        Some(ShutdownCause::SpontaneousExit("crashing".to_string()))
    );
}
