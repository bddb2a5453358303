use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cloudtest::logs::{JsonLog, Plan, State};
use cloudtest::render::{RenderError, Renderer};
use cloudtest::terminal::Streams;
use cloudtest::types::{PlanMode, RunStatus};
use cloudtest::view::TestView;

/// In-memory writer that can be cloned and inspected after the fact.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// `Streams` writing into fresh buffers: `(streams, stdout, stderr)`.
pub fn captured_streams(columns: usize) -> (Streams, SharedBuffer, SharedBuffer) {
    let stdout = SharedBuffer::new();
    let stderr = SharedBuffer::new();
    (
        Streams::new(stdout.clone(), stderr.clone(), columns),
        stdout,
        stderr,
    )
}

/// What a [`RecordingRenderer`] was asked to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Plan { plan: Plan, mode: PlanMode },
    State(State),
    Log(JsonLog),
}

/// A renderer that records everything it receives.
///
/// Logs whose message is listed in `fail_on` are rejected with a render
/// error instead.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    rendered: Arc<Mutex<Vec<Rendered>>>,
    fail_on: Vec<String>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, message: &str) -> Self {
        self.fail_on.push(message.to_string());
        self
    }

    pub fn rendered(&self) -> Vec<Rendered> {
        self.rendered.lock().unwrap().clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render_plan(&mut self, plan: Plan, mode: PlanMode) {
        self.rendered
            .lock()
            .unwrap()
            .push(Rendered::Plan { plan, mode });
    }

    fn render_state(&mut self, state: State) {
        self.rendered.lock().unwrap().push(Rendered::State(state));
    }

    fn render_log(&mut self, log: &JsonLog) -> Result<(), RenderError> {
        if self.fail_on.contains(&log.message) {
            return Err(RenderError::MissingDiagnostic);
        }
        self.rendered.lock().unwrap().push(Rendered::Log(log.clone()));
        Ok(())
    }
}

/// A view that records every status update.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    updates: Arc<Mutex<Vec<(RunStatus, Duration)>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<(RunStatus, Duration)> {
        self.updates.lock().unwrap().clone()
    }
}

impl TestView for RecordingView {
    fn status_update(&self, status: RunStatus, elapsed: Duration) {
        self.updates.lock().unwrap().push((status, elapsed));
    }
}
