// src/terminal.rs

//! Output streams shared by the view, the renderer and the log processor.
//!
//! Writes are best effort: a broken pipe on stdout must not abort log
//! rendering, so failures are only traced.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::debug;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Clone)]
pub struct Streams {
    stdout: SharedWriter,
    stderr: SharedWriter,
    /// Terminal width used for word wrapping; `0` disables wrapping.
    columns: usize,
}

impl fmt::Debug for Streams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streams")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl Streams {
    pub fn new(
        stdout: impl Write + Send + 'static,
        stderr: impl Write + Send + 'static,
        columns: usize,
    ) -> Self {
        Self {
            stdout: Arc::new(Mutex::new(Box::new(stdout))),
            stderr: Arc::new(Mutex::new(Box::new(stderr))),
            columns,
        }
    }

    /// Process stdout/stderr; the width comes from `COLUMNS` when set.
    pub fn stdio() -> Self {
        let columns = std::env::var("COLUMNS")
            .ok()
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(0);
        Self::new(io::stdout(), io::stderr(), columns)
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn print(&self, text: &str) {
        write_to(&self.stdout, text.as_bytes());
    }

    pub fn println(&self, text: &str) {
        write_to(&self.stdout, format!("{text}\n").as_bytes());
    }

    /// Print `line` and a newline to stdout without any re-encoding.
    pub fn println_bytes(&self, line: &[u8]) {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line);
        bytes.push(b'\n');
        write_to(&self.stdout, &bytes);
    }

    pub fn eprint(&self, text: &str) {
        write_to(&self.stderr, text.as_bytes());
    }

    pub fn eprintln(&self, text: &str) {
        write_to(&self.stderr, format!("{text}\n").as_bytes());
    }
}

fn write_to(writer: &SharedWriter, bytes: &[u8]) {
    let mut guard = writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Err(e) = guard.write_all(bytes).and_then(|()| guard.flush()) {
        debug!(error = %e, "failed to write to output stream");
    }
}

/// Wrap `text` at `width` columns, breaking only between words.
///
/// Existing line breaks are kept, as are leading/trailing empty lines.
/// A width of `0` leaves the text untouched; words longer than the width
/// get a line of their own.
pub fn word_wrap(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }

        let mut current = 0;
        for word in line.split(' ').filter(|w| !w.is_empty()) {
            let len = word.chars().count();
            if current > 0 && current + 1 + len > width {
                out.push('\n');
                current = 0;
            } else if current > 0 {
                out.push(' ');
                current += 1;
            }
            out.push_str(word);
            current += len;
        }
    }
    out
}
