// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::JoinError;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::client::{ClientError, TestRun, TestRunClient};
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::engine::backoff::{backoff, BACKOFF_MAX_MS, BACKOFF_MIN_MS};
use crate::engine::core::{MonitorCore, STATUS_REPORT_INTERVAL};
use crate::engine::signals::InterruptSignals;
use crate::engine::{MonitorCommand, MonitorEvent};
use crate::view::TestView;

/// Tunables for [`RunMonitor`].
#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    pub backoff_min_ms: f64,
    pub backoff_max_ms: f64,
    pub report_interval: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            backoff_min_ms: BACKOFF_MIN_MS,
            backoff_max_ms: BACKOFF_MAX_MS,
            report_interval: STATUS_REPORT_INTERVAL,
        }
    }
}

/// Which cancellation an escalation request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscalationKind {
    Graceful,
    Force,
}

impl EscalationKind {
    /// Diagnostic telling the user to cancel the run by hand.
    fn failure(self, err: &dyn fmt::Display) -> Diagnostic {
        let (summary, action) = match self {
            EscalationKind::Graceful => ("Could not cancel the test run", "cancel"),
            EscalationKind::Force => ("Could not force cancel the test run", "force cancel"),
        };
        Diagnostic::sourceless(
            Severity::Error,
            summary,
            format!(
                "Terraform could not {action} the test run, you will have to navigate to the Terraform Cloud console and cancel the test run manually.\n\nThe error message received when cancelling the test run was {err}"
            ),
        )
    }
}

type EscalationOutcome = (EscalationKind, Result<Result<(), ClientError>, JoinError>);

/// An escalation request running on its own task.
///
/// Dropping it detaches the task; the request itself keeps going.
type Escalation = BoxFuture<'static, EscalationOutcome>;

/// Waits for a remote run to leave the queue.
///
/// This is the IO shell around [`MonitorCore`]: it races the backoff timer
/// against the interrupt signals, performs the polls, reports status
/// observations to the view, and sends escalation requests. All decisions
/// are made by the core.
pub struct RunMonitor {
    client: Arc<dyn TestRunClient>,
    view: Arc<dyn TestView>,
    options: MonitorOptions,
}

impl fmt::Debug for RunMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunMonitor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RunMonitor {
    pub fn new(client: Arc<dyn TestRunClient>, view: Arc<dyn TestView>) -> Self {
        Self::with_options(client, view, MonitorOptions::default())
    }

    pub fn with_options(
        client: Arc<dyn TestRunClient>,
        view: Arc<dyn TestView>,
        options: MonitorOptions,
    ) -> Self {
        Self {
            client,
            view,
            options,
        }
    }

    /// Wait until `run` is no longer queued.
    ///
    /// Interrupts never end the wait: they only change which cancellation
    /// has been requested remotely, and polling continues so the logs can
    /// still be read afterwards. Escalation failures are appended to
    /// `diags`; a failing poll ends the wait with the returned fatal
    /// diagnostic.
    ///
    /// Returns as soon as a poll settles. Escalation requests still in
    /// flight at that point are left running and their outcome is only
    /// traced.
    pub async fn wait(
        &self,
        run: TestRun,
        signals: &InterruptSignals,
        diags: &mut Diagnostics,
    ) -> Result<TestRun, Diagnostic> {
        let started = Instant::now();
        let mut core = MonitorCore::new(self.options.report_interval);
        let mut run = run;
        let mut escalations: FuturesUnordered<Escalation> = FuturesUnordered::new();
        let mut next_poll = started + self.delay(&core);

        info!(run_id = %run.id, status = %run.status, "waiting for test run");

        loop {
            let event = tokio::select! {
                biased;

                _ = signals.cancelled(), if core.watches_cancel() => MonitorEvent::CancelRequested,
                _ = signals.stopped(), if core.watches_stop() => MonitorEvent::StopRequested,
                Some(joined) = escalations.next(), if !escalations.is_empty() => {
                    collect_escalation(joined, diags);
                    continue;
                }
                _ = sleep_until(next_poll) => MonitorEvent::TimerElapsed,
            };

            debug!(run_id = %run.id, ?event, escalation = ?core.escalation(), "monitor event");

            let mut commands: VecDeque<MonitorCommand> = core.step(event).commands.into();

            while let Some(command) = commands.pop_front() {
                match command {
                    MonitorCommand::PollStatus => {
                        let polled = self.client.read_test_run(&run.id).await;
                        match polled {
                            Ok(latest) => {
                                run = latest;
                                let elapsed = started.elapsed();
                                debug!(run_id = %run.id, status = %run.status, ?elapsed, "polled test run");
                                commands.extend(core.step(MonitorEvent::Polled {
                                    status: run.status,
                                    elapsed,
                                }).commands);
                            }
                            Err(err) => {
                                warn!(run_id = %run.id, error = %err, "failed to poll test run");
                                collect_finished(&mut escalations, diags);
                                return Err(Diagnostic::general_error(
                                    "Failed to retrieve test run",
                                    err,
                                ));
                            }
                        }
                    }
                    MonitorCommand::ReportStatus { status, elapsed } => {
                        self.view.status_update(status, elapsed);
                    }
                    MonitorCommand::SendGracefulCancel => {
                        escalations.push(self.spawn_escalation(EscalationKind::Graceful, &run.id));
                    }
                    MonitorCommand::SendForceCancel => {
                        escalations.push(self.spawn_escalation(EscalationKind::Force, &run.id));
                    }
                    MonitorCommand::Settle(status) => {
                        info!(run_id = %run.id, %status, "test run settled");
                        collect_finished(&mut escalations, diags);
                        return Ok(run);
                    }
                }
            }

            next_poll = Instant::now() + self.delay(&core);
        }
    }

    fn delay(&self, core: &MonitorCore) -> Duration {
        backoff(
            self.options.backoff_min_ms,
            self.options.backoff_max_ms,
            core.attempt(),
        )
    }

    /// The request runs on its own task: neither a further interrupt nor
    /// dropping the wait future can abort it once issued.
    fn spawn_escalation(&self, kind: EscalationKind, run_id: &str) -> Escalation {
        info!(run_id, ?kind, "requesting cancellation of test run");
        let client = Arc::clone(&self.client);
        let run_id = run_id.to_string();
        let handle = tokio::spawn(async move {
            let result = match kind {
                EscalationKind::Graceful => client.cancel_test_run(&run_id).await,
                EscalationKind::Force => client.force_cancel_test_run(&run_id).await,
            };
            if let Err(err) = &result {
                warn!(run_id = %run_id, ?kind, error = %err, "cancellation request failed");
            }
            result
        });
        handle.map(move |joined| (kind, joined)).boxed()
    }
}

fn collect_escalation((kind, joined): EscalationOutcome, diags: &mut Diagnostics) {
    match joined {
        Ok(Ok(())) => debug!(?kind, "escalation request accepted"),
        Ok(Err(err)) => diags.push(kind.failure(&err)),
        Err(err) => {
            warn!(?kind, error = %err, "escalation request task did not complete");
            diags.push(kind.failure(&err));
        }
    }
}

/// Collect escalation requests that already finished; pending ones keep
/// running detached.
fn collect_finished(escalations: &mut FuturesUnordered<Escalation>, diags: &mut Diagnostics) {
    while let Some(Some(outcome)) = escalations.next().now_or_never() {
        collect_escalation(outcome, diags);
    }
    if !escalations.is_empty() {
        info!(
            pending = escalations.len(),
            "leaving unfinished cancellation requests running"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_task_is_reported_with_its_own_kind() {
        let joined = tokio::spawn(async {
            if true {
                panic!("client panicked");
            }
            Ok::<(), ClientError>(())
        })
        .await;
        assert!(joined.is_err());

        let mut diags = Diagnostics::new();
        collect_escalation((EscalationKind::Force, joined), &mut diags);

        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.summary, "Could not force cancel the test run");
        assert!(diag.detail.contains("could not force cancel"));
    }

    #[test]
    fn graceful_failure_mentions_cancel() {
        let diag = EscalationKind::Graceful.failure(&"409 conflict");
        assert_eq!(diag.summary, "Could not cancel the test run");
        assert!(diag.detail.ends_with("was 409 conflict"));
    }
}
