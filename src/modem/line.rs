//! Incremental line assembly for modem output.
//!
//! Serial reads deliver arbitrary byte chunks; the modem speaks in
//! CR/LF-framed lines. `LineBuffer` accumulates chunks and hands back
//! complete lines, leaving partial tails buffered for the next read.

use memchr::memchr;

/// Accumulates raw serial bytes and yields complete, trimmed lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete line, if one is buffered.
    ///
    /// Lines are split on `\n`; surrounding whitespace (including the `\r`
    /// a modem sends before every `\n`) is trimmed. Non-UTF-8 bytes are
    /// replaced rather than rejected; line noise must not wedge the reader.
    pub fn pop_line(&mut self) -> Option<String> {
        let newline = memchr(b'\n', &self.buf)?;
        let line: Vec<u8> = self.buf.drain(..=newline).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    /// Number of buffered bytes not yet part of a complete line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
