// src/engine/core.rs

//! Pure run-monitor state machine.
//!
//! [`MonitorCore`] consumes [`MonitorEvent`]s and produces:
//! - an updated escalation state and backoff position
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::RunMonitor`) is responsible for:
//! - racing the backoff timer against the stop/cancel signals
//! - talking to the remote service
//! - reporting status observations and collecting escalation failures
//!
//! The core has no Tokio types, no clock and no client, so every
//! escalation edge can be unit tested directly.

use std::time::Duration;

use crate::engine::event_handlers::{
    handle_cancel, handle_polled, handle_stop, handle_timer, MonitorState,
};
use crate::engine::{EscalationState, MonitorEvent, MonitorStep};

/// Default spacing between two status observations.
pub const STATUS_REPORT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct MonitorCore {
    state: MonitorState,
}

impl Default for MonitorCore {
    fn default() -> Self {
        Self::new(STATUS_REPORT_INTERVAL)
    }
}

impl MonitorCore {
    pub fn new(report_interval: Duration) -> Self {
        Self {
            state: MonitorState {
                escalation: EscalationState::Polling,
                attempt: 0,
                queued_polls: 0,
                last_report: None,
                report_interval,
            },
        }
    }

    pub fn escalation(&self) -> EscalationState {
        self.state.escalation
    }

    /// Position in the backoff schedule for the next wait.
    pub fn attempt(&self) -> u32 {
        self.state.attempt
    }

    /// Whether the stop signal can still change anything.
    pub fn watches_stop(&self) -> bool {
        self.state.escalation == EscalationState::Polling
    }

    /// Whether the cancel signal can still change anything.
    pub fn watches_cancel(&self) -> bool {
        self.state.escalation != EscalationState::ForceCancelSent
    }

    /// Handle a single event, returning the commands for the IO shell.
    pub fn step(&mut self, event: MonitorEvent) -> MonitorStep {
        match event {
            MonitorEvent::TimerElapsed => handle_timer(&mut self.state),
            MonitorEvent::Polled { status, elapsed } => {
                handle_polled(&mut self.state, status, elapsed)
            }
            MonitorEvent::StopRequested => handle_stop(&mut self.state),
            MonitorEvent::CancelRequested => handle_cancel(&mut self.state),
        }
    }
}
