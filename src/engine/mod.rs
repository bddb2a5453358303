// src/engine/mod.rs

//! Remote run orchestration engine.
//!
//! This module ties together:
//! - submission of the test configuration and creation of the remote run
//! - the run monitor that polls the run on a backoff schedule and reacts to
//!   stop/cancel interrupts by escalating remote-side cancellation
//!
//! The pure escalation state machine lives in [`core`]; the async/IO shell
//! is implemented in [`runtime`].

use std::time::Duration;

use crate::types::RunStatus;

/// Which remote-side action has been requested so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationState {
    /// No interrupt observed; just waiting for the run to leave the queue.
    Polling,
    /// A graceful cancel has been requested.
    GracefulStopSent,
    /// A force cancel has been requested. Nothing further can escalate.
    ForceCancelSent,
}

/// Events flowing into the monitor core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The backoff wait for the current attempt elapsed.
    TimerElapsed,
    /// A status poll completed.
    Polled {
        status: RunStatus,
        elapsed: Duration,
    },
    /// The stop signal fired.
    StopRequested,
    /// The cancel signal fired.
    CancelRequested,
}

/// Command produced by the core, to be executed by the IO shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Re-read the run from the service.
    PollStatus,
    /// Tell the view how long the run has been waiting.
    ReportStatus {
        status: RunStatus,
        elapsed: Duration,
    },
    /// Ask the service to wind the run down gracefully.
    SendGracefulCancel,
    /// Ask the service to halt the run immediately.
    SendForceCancel,
    /// The run left the queue; stop waiting.
    Settle(RunStatus),
}

/// Decision returned by the core after handling a single `MonitorEvent`.
#[derive(Debug, Clone)]
pub struct MonitorStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<MonitorCommand>,
    /// Whether the wait loop should keep going.
    pub keep_waiting: bool,
}

impl MonitorStep {
    fn waiting(commands: Vec<MonitorCommand>) -> Self {
        Self {
            commands,
            keep_waiting: true,
        }
    }

    fn settled(status: RunStatus) -> Self {
        Self {
            commands: vec![MonitorCommand::Settle(status)],
            keep_waiting: false,
        }
    }
}

pub mod backoff;
pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod signals;
pub mod submission;

pub use backoff::backoff;
pub use core::MonitorCore;
pub use runtime::{MonitorOptions, RunMonitor};
pub use signals::{InterruptLevel, InterruptSignals};
pub use submission::{Submission, SubmissionRequest, Submitted};
