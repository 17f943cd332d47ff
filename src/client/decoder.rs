//! Frame decoder: one line of the stream body in, at most one envelope out.
//!
//! Pure and I/O free. Blank lines are keep-alive padding and decode to
//! `Ok(None)`. Anything that is not a JSON object shaped like a `Record`
//! is reported as `FluidinfoError::MalformedRecord`; the stream reader
//! logs and drops such lines without interrupting the stream.

use crate::error::Result;
use crate::types::{Envelope, Record};

/// Decoder for newline-delimited JSON records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    /// Decode one line (terminator already stripped).
    ///
    /// # Examples
    ///
    /// ```
    /// use fluidinfo_stream::client::FrameDecoder;
    ///
    /// let envelope = FrameDecoder::decode(br#"{"id":"1","tags":{}}"#).unwrap().unwrap();
    /// assert_eq!(envelope.record().id(), "1");
    ///
    /// assert!(FrameDecoder::decode(b"   ").unwrap().is_none());
    /// assert!(FrameDecoder::decode(b"{oops").is_err());
    /// ```
    pub fn decode(line: &[u8]) -> Result<Option<Envelope>> {
        let text = std::str::from_utf8(line)?.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let record: Record = serde_json::from_str(text)?;
        Ok(Some(Envelope::new(text, record)))
    }
}
