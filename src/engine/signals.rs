// src/engine/signals.rs

//! Stop and cancel interrupt signals.
//!
//! Two one-shot flags are handed to the orchestrator by the surrounding CLI:
//!
//! - **stop**: wind the remote run down gracefully; cleanup still happens.
//! - **cancel**: halt the remote run immediately; whatever was created is
//!   left behind and reported.
//!
//! The stop token is a child of the cancel token, so firing cancel always
//! fires stop too.

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{info, warn};

/// Which signal a call to [`InterruptSignals::interrupt`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptLevel {
    Stop,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct InterruptSignals {
    stop: CancellationToken,
    cancel: CancellationToken,
}

impl Default for InterruptSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptSignals {
    pub fn new() -> Self {
        let cancel = CancellationToken::new();
        let stop = cancel.child_token();
        Self { stop, cancel }
    }

    /// Fire the stop signal.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Fire the cancel signal (and, through it, the stop signal).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once stop (or cancel) has fired.
    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.stop.cancelled()
    }

    /// Resolves once cancel has fired.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Escalate by one level: the first call stops, any later call cancels.
    pub fn interrupt(&self) -> InterruptLevel {
        if self.is_stopped() {
            self.cancel();
            InterruptLevel::Cancel
        } else {
            self.stop();
            InterruptLevel::Stop
        }
    }

    /// Map Ctrl-C presses onto [`interrupt`](Self::interrupt).
    ///
    /// The first press requests a graceful stop, the second a hard cancel;
    /// the listener exits after that.
    pub fn spawn_ctrl_c_listener(&self) -> JoinHandle<()> {
        let signals = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    return;
                }
                match signals.interrupt() {
                    InterruptLevel::Stop => {
                        info!("interrupt received; requesting graceful stop (press Ctrl+C again to cancel)");
                    }
                    InterruptLevel::Cancel => {
                        warn!("second interrupt received; requesting cancellation");
                        return;
                    }
                }
            }
        })
    }
}
