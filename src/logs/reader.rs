// src/logs/reader.rs

//! Line reassembly over the raw log byte stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Size of the read buffer in front of the log stream.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Yields complete lines from an async byte stream.
///
/// Lines longer than the read buffer are joined back together. The
/// newline (and a preceding `\r`) is stripped. An empty segment after the
/// final newline is not a line.
pub struct LineReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(READ_BUFFER_SIZE, reader),
        }
    }

    /// The next line, or `None` at end of stream.
    pub async fn next_line(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        if self.inner.read_until(b'\n', &mut line).await? == 0 {
            return Ok(None);
        }

        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}
