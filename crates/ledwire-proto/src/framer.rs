//! Line framing for inbound serial data.
//!
//! The transport hands us text in whatever chunk sizes the USB stack produced.
//! A reply like `"OK\r\n"` can arrive as `"O"`, `"K\r"`, `"\n"`. The framer
//! owns a buffer for exactly one source and yields each line once its
//! `\r\n` terminator has fully arrived.
//!
//! # Invariants
//!
//! - Lines come out in arrival order and never contain the delimiter.
//! - After every call the buffer holds no complete line.
//! - Emitted lines, each followed by [`DELIMITER`], concatenated with
//!   [`LineFramer::pending`] equal everything ever fed.
//!
//! A source that never sends a delimiter grows the buffer without bound.
//! That is expected: the framer has no notion of a maximum line length.

/// Line terminator for inbound data.
pub const DELIMITER: &str = "\r\n";

/// Accumulates chunks from one source and splits them into lines.
///
/// Keep one framer per `(device, interface)` pair. Sharing a framer between
/// sources interleaves their fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFramer {
    buffer: String,
}

impl LineFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self { buffer: String::new() }
    }

    /// Append `chunk` and return every line it completed.
    ///
    /// An empty chunk is a no-op.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        let mut lines = Vec::new();
        self.feed_with(chunk, |line| lines.push(line));
        lines
    }

    /// Append `chunk` and hand each completed line to `emit`.
    ///
    /// Returns the number of lines emitted.
    pub fn feed_with<F>(&mut self, chunk: &str, mut emit: F) -> usize
    where
        F: FnMut(String),
    {
        if chunk.is_empty() {
            return 0;
        }

        // Only the tail can start a new delimiter: a trailing '\r' from the
        // previous chunk is the one byte of old data worth rescanning.
        let mut search_from =
            if self.buffer.ends_with('\r') { self.buffer.len() - 1 } else { self.buffer.len() };
        self.buffer.push_str(chunk);

        let mut consumed = 0;
        let mut emitted = 0;
        while let Some(offset) = self.buffer[search_from..].find(DELIMITER) {
            let end = search_from + offset;
            emit(self.buffer[consumed..end].to_string());
            emitted += 1;
            consumed = end + DELIMITER.len();
            search_from = consumed;
        }

        if consumed > 0 {
            self.buffer.drain(..consumed);
        }
        emitted
    }

    /// Content received since the last complete line.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard any buffered fragment.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Consume the framer, returning the unterminated remainder.
    pub fn into_remainder(self) -> String {
        self.buffer
    }
}
