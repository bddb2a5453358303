// src/view.rs

//! Status observations while a remote run waits in the queue.

use std::time::Duration;

use crate::terminal::Streams;
use crate::types::RunStatus;

/// Receives `(status, elapsed)` observations from the run monitor.
///
/// The monitor calls this at most once per reporting interval.
pub trait TestView: Send + Sync {
    fn status_update(&self, status: RunStatus, elapsed: Duration);
}

/// Human-readable status updates on stdout.
#[derive(Debug, Clone)]
pub struct TerminalView {
    streams: Streams,
}

impl TerminalView {
    pub fn new(streams: Streams) -> Self {
        Self { streams }
    }
}

impl TestView for TerminalView {
    fn status_update(&self, status: RunStatus, elapsed: Duration) {
        // Only queued runs are observed while waiting.
        if status.is_queued() {
            self.streams.println(&format!(
                "Waiting for the tests to start... ({} elapsed)",
                format_elapsed(elapsed)
            ));
        }
    }
}

/// Elapsed time truncated to 30 second steps, e.g. `0s`, `30s`, `1m0s`, `1h2m30s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs() / 30 * 30;
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
