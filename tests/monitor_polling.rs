use std::sync::Arc;
use std::time::Duration;

use cloudtest::client::{ClientError, TestRun};
use cloudtest::diagnostics::Diagnostics;
use cloudtest::engine::{InterruptSignals, RunMonitor};
use cloudtest::types::RunStatus;
use cloudtest_test_utils::fake_client::{Call, ScriptedClient, RUN_ID};
use cloudtest_test_utils::init_tracing;
use cloudtest_test_utils::recording::RecordingView;

fn queued_run() -> TestRun {
    TestRun {
        id: RUN_ID.to_string(),
        status: RunStatus::Pending,
    }
}

#[tokio::test(start_paused = true)]
async fn polls_until_the_run_leaves_the_queue() {
    init_tracing();

    let client = ScriptedClient::new([RunStatus::Queued, RunStatus::Queued, RunStatus::Errored])
        .into_shared();
    let view = RecordingView::new();
    let monitor = RunMonitor::new(client.clone(), Arc::new(view.clone()));
    let mut diags = Diagnostics::new();

    let run = monitor
        .wait(queued_run(), &InterruptSignals::new(), &mut diags)
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Errored);
    assert_eq!(client.count(Call::ReadTestRun), 3);
    assert!(diags.is_empty());

    // Nothing keeps polling once the wait returned.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(client.count(Call::ReadTestRun), 3);
}

#[tokio::test(start_paused = true)]
async fn poll_spacing_grows_and_stays_within_bounds() {
    init_tracing();

    let mut statuses = vec![RunStatus::Queued; 15];
    statuses.push(RunStatus::Running);
    let client = ScriptedClient::new(statuses).into_shared();
    let monitor = RunMonitor::new(client.clone(), Arc::new(RecordingView::new()));
    let mut diags = Diagnostics::new();

    let started = tokio::time::Instant::now();
    let run = monitor
        .wait(queued_run(), &InterruptSignals::new(), &mut diags)
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Running);

    let instants = client.poll_instants();
    assert_eq!(instants.len(), 16);

    let first = instants[0] - started;
    assert!(first >= Duration::from_millis(1000) && first < Duration::from_millis(1010));

    let gaps: Vec<Duration> = instants.windows(2).map(|w| w[1] - w[0]).collect();
    for pair in gaps.windows(2) {
        assert!(pair[1] + Duration::from_millis(2) >= pair[0], "gaps shrank: {gaps:?}");
    }
    for gap in &gaps {
        assert!(*gap >= Duration::from_millis(1000));
        assert!(*gap <= Duration::from_millis(3010));
    }
    assert!(gaps[0] > Duration::from_millis(1100));
    assert!(gaps.last().unwrap() >= &Duration::from_millis(2990));
}

#[tokio::test(start_paused = true)]
async fn status_is_reported_first_and_then_at_most_every_thirty_seconds() {
    init_tracing();

    let mut statuses = vec![RunStatus::Queued; 40];
    statuses.push(RunStatus::Errored);
    let client = ScriptedClient::new(statuses).into_shared();
    let view = RecordingView::new();
    let monitor = RunMonitor::new(client.clone(), Arc::new(view.clone()));
    let mut diags = Diagnostics::new();

    monitor
        .wait(queued_run(), &InterruptSignals::new(), &mut diags)
        .await
        .unwrap();

    let updates = view.updates();
    assert!(updates.len() >= 3, "updates: {updates:?}");
    assert!(updates.iter().all(|(status, _)| *status == RunStatus::Queued));

    let (_, first) = updates[0];
    assert!(first >= Duration::from_millis(1000) && first < Duration::from_millis(1100));

    for pair in updates.windows(2) {
        let gap = pair[1].1 - pair[0].1;
        assert!(gap > Duration::from_secs(30), "reported too early: {gap:?}");
        assert!(gap <= Duration::from_secs(34), "reported too late: {gap:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn a_failing_poll_ends_the_wait() {
    init_tracing();

    let client = ScriptedClient::new([RunStatus::Queued])
        .failing(Call::ReadTestRun, ClientError::Transport("connection refused".into()))
        .into_shared();
    let view = RecordingView::new();
    let monitor = RunMonitor::new(client.clone(), Arc::new(view.clone()));
    let mut diags = Diagnostics::new();

    let fatal = monitor
        .wait(queued_run(), &InterruptSignals::new(), &mut diags)
        .await
        .unwrap_err();

    assert_eq!(fatal.summary, "Failed to retrieve test run");
    assert!(fatal.detail.contains("connection refused"));
    assert_eq!(client.count(Call::ReadTestRun), 1);
    assert!(view.updates().is_empty());
    assert!(diags.is_empty());
}
