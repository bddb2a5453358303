// src/logs/processor.rs

use std::fmt;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::client::TestRunClient;
use crate::config::RunConfigLookup;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::logs::enrich::{Plan, ProviderSchemas, State};
use crate::logs::interrupt::render_interrupt;
use crate::logs::reader::LineReader;
use crate::logs::record::LogRecord;
use crate::render::Renderer;
use crate::terminal::Streams;

/// Where complete log lines end up.
///
/// Per-line failures are recoverable: they are appended to `diags` and the
/// stream carries on with the next line.
pub trait RenderTarget: Send {
    fn render_line(&mut self, line: &[u8], diags: &mut Diagnostics);
}

/// Prints every line verbatim to stdout.
#[derive(Debug, Clone)]
pub struct RawTarget {
    streams: Streams,
}

impl RawTarget {
    pub fn new(streams: Streams) -> Self {
        Self { streams }
    }
}

impl RenderTarget for RawTarget {
    fn render_line(&mut self, line: &[u8], _diags: &mut Diagnostics) {
        self.streams.println_bytes(line);
    }
}

/// Decodes each line, enriches plan and state records, and dispatches to a
/// [`Renderer`].
pub struct DecodingTarget<R> {
    renderer: R,
    streams: Streams,
    lookup: Arc<RunConfigLookup>,
    schemas: Arc<ProviderSchemas>,
}

impl<R: Renderer> DecodingTarget<R> {
    pub fn new(
        renderer: R,
        streams: Streams,
        lookup: Arc<RunConfigLookup>,
        schemas: Arc<ProviderSchemas>,
    ) -> Self {
        Self {
            renderer,
            streams,
            lookup,
            schemas,
        }
    }

    /// Print the undecoded line so its content is not lost.
    fn fallback(&self, line: &[u8]) {
        self.streams.println_bytes(line);
    }
}

impl<R: Renderer> RenderTarget for DecodingTarget<R> {
    fn render_line(&mut self, line: &[u8], diags: &mut Diagnostics) {
        let record = match LogRecord::decode(line) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "failed to decode log line");
                diags.push(Diagnostic::general_error("Failed to render log line", err));
                self.fallback(line);
                return;
            }
        };

        debug!(kind = ?record.log().kind, "dispatching log record");

        match record {
            LogRecord::Interrupt { log, interrupt } => {
                render_interrupt(&self.streams, &self.lookup, &log, &interrupt);
            }
            LogRecord::Plan { log, plan } => {
                let mode = self.lookup.plan_mode(&log.test_file, &log.test_run);
                self.renderer
                    .render_plan(Plan::enrich(plan, &self.schemas), mode);
            }
            LogRecord::State { state, .. } => {
                self.renderer.render_state(State::enrich(state, &self.schemas));
            }
            LogRecord::Generic(log) => {
                if let Err(err) = self.renderer.render_log(&log) {
                    warn!(error = %err, "failed to render log line");
                    diags.push(Diagnostic::general_error("Failed to render log line", err));
                    self.fallback(line);
                }
            }
        }
    }
}

/// Reads a run's log stream and renders it line by line.
pub struct LogStreamProcessor {
    target: Box<dyn RenderTarget>,
}

impl fmt::Debug for LogStreamProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogStreamProcessor").finish_non_exhaustive()
    }
}

impl LogStreamProcessor {
    pub fn new(target: impl RenderTarget + 'static) -> Self {
        Self {
            target: Box::new(target),
        }
    }

    /// Print the stream as raw JSON lines.
    pub fn raw(streams: Streams) -> Self {
        Self::new(RawTarget::new(streams))
    }

    pub fn with_renderer<R: Renderer + 'static>(
        renderer: R,
        streams: Streams,
        lookup: Arc<RunConfigLookup>,
        schemas: Arc<ProviderSchemas>,
    ) -> Self {
        Self::new(DecodingTarget::new(renderer, streams, lookup, schemas))
    }

    /// Fetch the logs of `run_id` and render them.
    pub async fn render(
        &mut self,
        client: &dyn TestRunClient,
        run_id: &str,
        diags: &mut Diagnostics,
    ) -> Result<(), Diagnostic> {
        let logs = client
            .read_logs(run_id)
            .await
            .map_err(|err| Diagnostic::general_error("Failed to retrieve logs", err))?;
        debug!(run_id, "reading test run logs");
        self.render_stream(logs, diags).await
    }

    /// Render every line of `reader` until end of stream.
    ///
    /// A read error ends rendering with a fatal diagnostic; lines already
    /// rendered and diagnostics already appended are kept.
    pub async fn render_stream<S>(
        &mut self,
        reader: S,
        diags: &mut Diagnostics,
    ) -> Result<(), Diagnostic>
    where
        S: AsyncRead + Unpin,
    {
        let mut lines = LineReader::new(reader);
        let mut count = 0usize;
        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|err| Diagnostic::general_error("Failed to read logs", err))?;
            let Some(line) = line else {
                break;
            };
            self.target.render_line(&line, diags);
            count += 1;
        }
        debug!(lines = count, "finished rendering logs");
        Ok(())
    }
}
