// src/engine/event_handlers.rs

//! Event handling logic for the monitor core.

use std::time::Duration;

use crate::engine::{EscalationState, MonitorCommand, MonitorStep};
use crate::types::RunStatus;

/// Bookkeeping the handlers share.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub escalation: EscalationState,
    /// Index into the backoff schedule for the next wait.
    pub attempt: u32,
    /// Number of polls that observed a still-queued run.
    pub queued_polls: u64,
    /// Elapsed time at which the last status observation was reported.
    pub last_report: Option<Duration>,
    /// Minimum spacing between two status observations.
    pub report_interval: Duration,
}

/// The backoff timer fired: poll the run.
pub fn handle_timer(_state: &mut MonitorState) -> MonitorStep {
    MonitorStep::waiting(vec![MonitorCommand::PollStatus])
}

/// A poll came back with `status`.
///
/// - anything but `queued` settles the wait, whatever has been requested;
/// - a queued run advances the backoff schedule and may produce a status
///   observation (always on the first poll, then only once the interval
///   has passed since the previous one).
pub fn handle_polled(state: &mut MonitorState, status: RunStatus, elapsed: Duration) -> MonitorStep {
    if !status.is_queued() {
        return MonitorStep::settled(status);
    }

    let mut commands = Vec::new();

    let due = match state.last_report {
        None => state.queued_polls == 0,
        Some(last) => elapsed.saturating_sub(last) > state.report_interval,
    };
    if due {
        state.last_report = Some(elapsed);
        commands.push(MonitorCommand::ReportStatus { status, elapsed });
    }

    state.queued_polls += 1;
    state.attempt = state.attempt.saturating_add(1);

    MonitorStep::waiting(commands)
}

/// The stop signal fired.
///
/// Only the first observation while still `Polling` sends a request; the
/// signal stays fired, so later observations are ignored.
pub fn handle_stop(state: &mut MonitorState) -> MonitorStep {
    match state.escalation {
        EscalationState::Polling => {
            state.escalation = EscalationState::GracefulStopSent;
            MonitorStep::waiting(vec![MonitorCommand::SendGracefulCancel])
        }
        EscalationState::GracefulStopSent | EscalationState::ForceCancelSent => {
            MonitorStep::waiting(Vec::new())
        }
    }
}

/// The cancel signal fired.
///
/// Sends the force cancel exactly once and restarts the backoff schedule.
pub fn handle_cancel(state: &mut MonitorState) -> MonitorStep {
    match state.escalation {
        EscalationState::Polling | EscalationState::GracefulStopSent => {
            state.escalation = EscalationState::ForceCancelSent;
            state.attempt = 0;
            MonitorStep::waiting(vec![MonitorCommand::SendForceCancel])
        }
        EscalationState::ForceCancelSent => MonitorStep::waiting(Vec::new()),
    }
}
