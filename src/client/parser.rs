//! Line framing for newline-delimited stream bodies.
//!
//! Incremental, state-machine based splitter that turns arbitrary body
//! chunks into complete lines. A line may arrive split across any number of
//! chunks; it is only emitted once its terminating `\n` has been seen.
//!
//! # Parsing Flow
//!
//! 1. **Buffering**: Accumulate bytes until a `\n` is found, then emit the
//!    line without its `\n` / `\r\n` terminator
//! 2. **Discarding**: The pending line outgrew the limit; drop bytes until
//!    the next `\n`, then return to Buffering
//!
//! Bytes that never see a terminator (the connection dropped mid-line) are
//! simply lost with the parser. Each connection gets a fresh parser.
//!
//! # Examples
//!
//! ```
//! use fluidinfo_stream::client::{Line, LineParser};
//!
//! let mut parser = LineParser::new(1024);
//! assert!(parser.feed(b"{\"id\":").is_empty());
//! let lines = parser.feed(b"\"1\"}\r\n");
//! assert_eq!(lines, vec![Line::Complete(b"{\"id\":\"1\"}".to_vec().into())]);
//! ```

use bytes::{Bytes, BytesMut};

/// Parse state for the line splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Accumulating bytes of the current line
    Buffering,
    /// Dropping the remainder of an oversized line
    Discarding,
}

/// One unit produced by [`LineParser::feed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A complete line with its terminator stripped
    Complete(Bytes),
    /// A line exceeded the size limit and was dropped
    Oversized,
}

/// Incremental newline splitter.
#[derive(Debug)]
pub struct LineParser {
    /// Bytes of the line currently being assembled
    buffer: BytesMut,
    /// Current state in the splitter state machine
    state: ParseState,
    /// Longest line accepted, terminator excluded
    max_line_bytes: usize,
}

impl LineParser {
    /// Create a parser that drops lines longer than `max_line_bytes`.
    pub fn new(max_line_bytes: usize) -> Self {
        LineParser {
            buffer: BytesMut::with_capacity(8192),
            state: ParseState::Buffering,
            max_line_bytes,
        }
    }

    /// Feed bytes to the parser, returning every line they complete.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Line> {
        self.buffer.extend_from_slice(data);
        let mut lines = Vec::new();

        loop {
            let newline = self.buffer.iter().position(|b| *b == b'\n');
            match (self.state, newline) {
                (ParseState::Discarding, Some(pos)) => {
                    let _ = self.buffer.split_to(pos + 1);
                    self.state = ParseState::Buffering;
                }
                (ParseState::Discarding, None) => {
                    self.buffer.clear();
                    break;
                }
                (ParseState::Buffering, Some(pos)) => {
                    let mut line = self.buffer.split_to(pos + 1);
                    line.truncate(pos);
                    if line.last() == Some(&b'\r') {
                        line.truncate(pos - 1);
                    }
                    if line.len() > self.max_line_bytes {
                        lines.push(Line::Oversized);
                    } else {
                        lines.push(Line::Complete(line.freeze()));
                    }
                }
                (ParseState::Buffering, None) => {
                    // +1 leaves room for a trailing '\r' still to be stripped
                    if self.buffer.len() > self.max_line_bytes + 1 {
                        self.buffer.clear();
                        self.state = ParseState::Discarding;
                        lines.push(Line::Oversized);
                    }
                    break;
                }
            }
        }

        lines
    }

    /// Get current parse state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Number of bytes waiting for a terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
