//! Denon RS-232 line protocol encoder/decoder.
//!
//! Commands and responses are ASCII lines terminated by a carriage return
//! (`\r`, 0x0D). There is no framing beyond the terminator and no request
//! identifiers, so a response is simply every line that arrives after a
//! command until the link goes quiet.
//!
//! # Command format
//!
//! ```text
//! <command>\r
//! ```
//!
//! e.g. `PWON\r`, `MV?\r`, `Z2CD\r`.
//!
//! # Response format
//!
//! One or more lines, each ending in `\r`:
//!
//! ```text
//! MV50\rMVMAX 80\r
//! ```

use bytes::{BufMut, BytesMut};

/// Line terminator for both commands and responses.
pub const TERMINATOR: u8 = b'\r';

/// Buffered bytes without a terminator beyond this are discarded.
/// Receiver lines are well under 32 bytes.
pub const MAX_LINE: usize = 8192;

/// Result of attempting to decode one line from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A complete line was decoded.
    Line {
        /// Decoded, trimmed line text.
        text: String,
        /// Number of bytes consumed from the input buffer (including the terminator).
        consumed: usize,
    },

    /// The buffer does not yet contain a terminator. More data is needed.
    Incomplete,
}

/// Encode a command into raw bytes ready for transmission.
///
/// # Example
///
/// ```
/// use denon232::protocol::encode_command;
///
/// assert_eq!(encode_command("PW?"), b"PW?\r");
/// assert_eq!(encode_command("SISAT/CBL"), b"SISAT/CBL\r");
/// ```
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(command.len() + 1);
    buf.put_slice(command.as_bytes());
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Decode raw line bytes into text.
///
/// Invalid UTF-8 is replaced rather than rejected, and surrounding
/// whitespace (including the terminator and any stray `\n`) is trimmed.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Attempt to decode one terminated line from the front of `buf`.
///
/// # Example
///
/// ```
/// use denon232::protocol::{decode_line, DecodeResult};
///
/// match decode_line(b"MVMAX 80\rMV50\r") {
///     DecodeResult::Line { text, consumed } => {
///         assert_eq!(text, "MVMAX 80");
///         assert_eq!(consumed, 9);
///     }
///     DecodeResult::Incomplete => panic!("expected Line"),
/// }
/// ```
pub fn decode_line(buf: &[u8]) -> DecodeResult {
    match buf.iter().position(|&b| b == TERMINATOR) {
        Some(pos) => DecodeResult::Line {
            text: decode_text(&buf[..pos]),
            consumed: pos + 1,
        },
        None => DecodeResult::Incomplete,
    }
}

/// Accumulates received bytes and splits them into lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes and return every line they completed.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(data);

        let mut lines = Vec::new();
        while let DecodeResult::Line { text, consumed } = decode_line(&self.buf) {
            self.buf.drain(..consumed);
            lines.push(text);
        }

        if self.buf.len() > MAX_LINE {
            tracing::warn!(len = self.buf.len(), "line buffer overflow, resetting");
            self.buf.clear();
        }

        lines
    }

    /// Flush whatever arrived without a terminator as a final line.
    ///
    /// Returns `None` when nothing is buffered.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let text = decode_text(&self.buf);
        self.buf.clear();
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Command encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_power_query() {
        assert_eq!(encode_command("PW?"), b"PW?\r");
    }

    #[test]
    fn encode_zone2_source() {
        assert_eq!(encode_command("Z2V.AUX"), b"Z2V.AUX\r");
    }

    #[test]
    fn encode_empty_command() {
        assert_eq!(encode_command(""), b"\r");
    }

    // ---------------------------------------------------------------
    // Line decoding
    // ---------------------------------------------------------------

    #[test]
    fn decode_empty_buffer() {
        assert_eq!(decode_line(b""), DecodeResult::Incomplete);
    }

    #[test]
    fn decode_no_terminator() {
        assert_eq!(decode_line(b"PWSTAND"), DecodeResult::Incomplete);
    }

    #[test]
    fn decode_single_line() {
        assert_eq!(
            decode_line(b"PWSTANDBY\r"),
            DecodeResult::Line {
                text: "PWSTANDBY".into(),
                consumed: 10,
            }
        );
    }

    #[test]
    fn decode_trims_whitespace_and_newline() {
        assert_eq!(
            decode_line(b" MUON\n\r"),
            DecodeResult::Line {
                text: "MUON".into(),
                consumed: 7,
            }
        );
    }

    #[test]
    fn decode_bare_terminator_is_empty_line() {
        assert_eq!(
            decode_line(b"\r"),
            DecodeResult::Line {
                text: String::new(),
                consumed: 1,
            }
        );
    }

    #[test]
    fn decode_invalid_utf8_is_replaced() {
        let line = decode_line(&[b'S', b'I', 0xFF, b'\r']);
        match line {
            DecodeResult::Line { text, consumed } => {
                assert!(text.starts_with("SI"));
                assert_eq!(consumed, 4);
            }
            DecodeResult::Incomplete => panic!("expected Line"),
        }
    }

    // ---------------------------------------------------------------
    // LineBuffer
    // ---------------------------------------------------------------

    #[test]
    fn line_buffer_splits_multiple_lines() {
        let mut lines = LineBuffer::new();
        assert_eq!(lines.push(b"MV50\rMVMAX 80\r"), vec!["MV50", "MVMAX 80"]);
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn line_buffer_joins_split_reads() {
        let mut lines = LineBuffer::new();
        assert!(lines.push(b"Z2O").is_empty());
        assert_eq!(lines.push(b"N\rZ2").as_slice(), ["Z2ON"]);
        assert_eq!(lines.push(b"CD\r").as_slice(), ["Z2CD"]);
    }

    #[test]
    fn line_buffer_finish_returns_partial_line() {
        let mut lines = LineBuffer::new();
        assert!(lines.push(b"SICD").is_empty());
        assert_eq!(lines.finish().as_deref(), Some("SICD"));
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn line_buffer_overflow_resets() {
        let mut lines = LineBuffer::new();
        let noise = vec![b'A'; MAX_LINE + 1];
        assert!(lines.push(&noise).is_empty());
        assert_eq!(lines.finish(), None);
    }
}
