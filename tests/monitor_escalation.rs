use std::sync::Arc;
use std::time::Duration;

use cloudtest::client::{ClientError, TestRun};
use cloudtest::diagnostics::{Diagnostics, Severity};
use cloudtest::engine::{InterruptLevel, InterruptSignals, RunMonitor};
use cloudtest::types::RunStatus;
use tokio::sync::Notify;
use cloudtest_test_utils::fake_client::{Call, ScriptedClient, RUN_ID};
use cloudtest_test_utils::init_tracing;
use cloudtest_test_utils::recording::RecordingView;

fn queued_run() -> TestRun {
    TestRun {
        id: RUN_ID.to_string(),
        status: RunStatus::Queued,
    }
}

fn queued_then(queued: usize, last: RunStatus) -> Vec<RunStatus> {
    let mut statuses = vec![RunStatus::Queued; queued];
    statuses.push(last);
    statuses
}

/// Fails the test instead of hanging when `wait` never returns. Virtual
/// time only reaches the limit once nothing else can make progress.
async fn wait_within_a_minute(
    client: &Arc<ScriptedClient>,
    signals: &InterruptSignals,
) -> (TestRun, Diagnostics) {
    tokio::time::timeout(Duration::from_secs(60), wait(client, signals))
        .await
        .expect("wait should return once a poll settles")
}

async fn wait(client: &Arc<ScriptedClient>, signals: &InterruptSignals) -> (TestRun, Diagnostics) {
    let monitor = RunMonitor::new(client.clone(), Arc::new(RecordingView::new()));
    let mut diags = Diagnostics::new();
    let run = monitor
        .wait(queued_run(), signals, &mut diags)
        .await
        .expect("wait should settle");
    (run, diags)
}

#[tokio::test(start_paused = true)]
async fn stop_while_queued_sends_one_graceful_cancel_and_keeps_polling() {
    init_tracing();

    let signals = InterruptSignals::new();
    let hook_signals = signals.clone();
    let client = ScriptedClient::new(queued_then(4, RunStatus::Canceled))
        .on_call(Call::ReadTestRun, move |n| {
            if n == 1 {
                hook_signals.stop();
            }
        })
        .into_shared();

    let (run, diags) = wait(&client, &signals).await;

    assert_eq!(run.status, RunStatus::Canceled);
    assert_eq!(client.count(Call::CancelTestRun), 1);
    assert_eq!(client.count(Call::ForceCancelTestRun), 0);
    assert_eq!(client.count(Call::ReadTestRun), 5);
    assert!(diags.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_then_repeated_cancels_force_cancel_exactly_once() {
    init_tracing();

    let signals = InterruptSignals::new();
    let hook_signals = signals.clone();
    let client = ScriptedClient::new(queued_then(6, RunStatus::ForceCanceled))
        .on_call(Call::ReadTestRun, move |n| {
            // Every poll after the first is another Ctrl-C.
            let level = hook_signals.interrupt();
            if n == 1 {
                assert_eq!(level, InterruptLevel::Stop);
            } else {
                assert_eq!(level, InterruptLevel::Cancel);
            }
        })
        .into_shared();

    let (run, diags) = wait(&client, &signals).await;

    assert_eq!(run.status, RunStatus::ForceCanceled);
    assert_eq!(client.count(Call::CancelTestRun), 1);
    assert_eq!(client.count(Call::ForceCancelTestRun), 1);
    assert_eq!(client.count(Call::ReadTestRun), 7);
    assert!(diags.is_empty());

    let calls = client.calls();
    let graceful = calls.iter().position(|c| *c == Call::CancelTestRun).unwrap();
    let force = calls.iter().position(|c| *c == Call::ForceCancelTestRun).unwrap();
    assert!(graceful < force);
}

#[tokio::test(start_paused = true)]
async fn cancel_without_stop_skips_the_graceful_request() {
    init_tracing();

    let signals = InterruptSignals::new();
    signals.cancel();
    let client = ScriptedClient::new(queued_then(2, RunStatus::ForceCanceled)).into_shared();

    let (run, diags) = wait(&client, &signals).await;

    assert_eq!(run.status, RunStatus::ForceCanceled);
    assert_eq!(client.count(Call::CancelTestRun), 0);
    assert_eq!(client.count(Call::ForceCancelTestRun), 1);
    assert!(diags.is_empty());
}

#[tokio::test(start_paused = true)]
async fn force_cancel_restarts_the_backoff_schedule() {
    init_tracing();

    let signals = InterruptSignals::new();
    let hook_signals = signals.clone();
    let client = ScriptedClient::new(queued_then(7, RunStatus::ForceCanceled))
        .on_call(Call::ReadTestRun, move |n| {
            if n == 6 {
                hook_signals.cancel();
            }
        })
        .into_shared();

    wait(&client, &signals).await;

    let instants = client.poll_instants();
    assert_eq!(instants.len(), 8);
    let before = instants[5] - instants[4];
    let after = instants[6] - instants[5];
    assert!(before >= Duration::from_millis(1990), "before cancel: {before:?}");
    assert!(after < Duration::from_millis(1010), "after cancel: {after:?}");
    assert!(after >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn failed_graceful_cancel_is_reported_and_monitoring_settles() {
    init_tracing();

    let signals = InterruptSignals::new();
    let hook_signals = signals.clone();
    let client = ScriptedClient::new(queued_then(3, RunStatus::Errored))
        .failing(
            Call::CancelTestRun,
            ClientError::Service {
                status: 409,
                message: "run is not cancelable".into(),
            },
        )
        .on_call(Call::ReadTestRun, move |n| {
            if n == 1 {
                hook_signals.stop();
            }
        })
        .into_shared();

    let (run, diags) = wait(&client, &signals).await;

    assert_eq!(run.status, RunStatus::Errored);
    assert_eq!(diags.len(), 1);
    let diag = diags.iter().next().unwrap();
    assert_eq!(diag.severity, Severity::Error);
    assert_eq!(diag.summary, "Could not cancel the test run");
    assert!(diag.detail.starts_with("Terraform could not cancel the test run, you will have to navigate to the Terraform Cloud console and cancel the test run manually."));
    assert!(diag.detail.ends_with("was service returned 409: run is not cancelable"));
}

#[tokio::test(start_paused = true)]
async fn failed_force_cancel_is_reported_and_monitoring_settles() {
    init_tracing();

    let signals = InterruptSignals::new();
    let hook_signals = signals.clone();
    let client = ScriptedClient::new(queued_then(3, RunStatus::Errored))
        .failing(
            Call::ForceCancelTestRun,
            ClientError::Transport("connection reset".into()),
        )
        .on_call(Call::ReadTestRun, move |n| {
            if n == 2 {
                hook_signals.cancel();
            }
        })
        .into_shared();

    let (run, diags) = wait(&client, &signals).await;

    assert_eq!(run.status, RunStatus::Errored);
    assert_eq!(client.count(Call::ForceCancelTestRun), 1);
    assert_eq!(diags.len(), 1);
    let diag = diags.iter().next().unwrap();
    assert_eq!(diag.summary, "Could not force cancel the test run");
    assert!(diag.detail.contains("Terraform could not force cancel the test run"));
    assert!(diag.detail.contains("connection reset"));
}

#[tokio::test(start_paused = true)]
async fn hanging_graceful_cancel_does_not_hold_up_settlement() {
    init_tracing();

    let signals = InterruptSignals::new();
    let hook_signals = signals.clone();
    let client = ScriptedClient::new(queued_then(3, RunStatus::Errored))
        .holding(Call::CancelTestRun, Arc::new(Notify::new()))
        .on_call(Call::ReadTestRun, move |n| {
            if n == 1 {
                hook_signals.stop();
            }
        })
        .into_shared();

    let (run, diags) = wait_within_a_minute(&client, &signals).await;

    assert_eq!(run.status, RunStatus::Errored);
    assert_eq!(client.count(Call::ReadTestRun), 4);
    assert_eq!(client.count(Call::CancelTestRun), 1);
    assert_eq!(client.completed(Call::CancelTestRun), 0);
    assert!(diags.is_empty());
}

#[tokio::test(start_paused = true)]
async fn hanging_force_cancel_does_not_hold_up_polling() {
    init_tracing();

    let signals = InterruptSignals::new();
    signals.cancel();
    let client = ScriptedClient::new(queued_then(5, RunStatus::ForceCanceled))
        .holding(Call::ForceCancelTestRun, Arc::new(Notify::new()))
        .into_shared();

    let (run, _diags) = wait_within_a_minute(&client, &signals).await;

    assert_eq!(run.status, RunStatus::ForceCanceled);
    assert_eq!(client.count(Call::ReadTestRun), 6);
    assert_eq!(client.count(Call::ForceCancelTestRun), 1);
    assert_eq!(client.completed(Call::ForceCancelTestRun), 0);
}

#[tokio::test(start_paused = true)]
async fn force_cancel_outlives_a_dropped_wait() {
    init_tracing();

    let signals = InterruptSignals::new();
    signals.cancel();
    let gate = Arc::new(Notify::new());
    let client = ScriptedClient::new([RunStatus::Queued])
        .holding(Call::ForceCancelTestRun, gate.clone())
        .into_shared();

    // The run never leaves the queue, so only the timeout ends the wait.
    let dropped = tokio::time::timeout(Duration::from_secs(10), wait(&client, &signals)).await;
    assert!(dropped.is_err());
    assert_eq!(client.count(Call::ForceCancelTestRun), 1);
    assert_eq!(client.completed(Call::ForceCancelTestRun), 0);

    let polls = client.count(Call::ReadTestRun);
    gate.notify_one();
    for _ in 0..10 {
        if client.completed(Call::ForceCancelTestRun) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(client.completed(Call::ForceCancelTestRun), 1);
    assert_eq!(client.count(Call::ForceCancelTestRun), 1);
    assert_eq!(client.count(Call::ReadTestRun), polls);
}
