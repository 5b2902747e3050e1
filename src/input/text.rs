//! UTF-8 text and line decoding.
//!
//! Decoding works on contiguous windows: a multi-byte sequence split across
//! two chunks is stitched before it is decoded, so the result never depends
//! on where chunk boundaries fall.

use std::str;

use super::{Input, Source};
use crate::error::{PacketError, Result};

/// Widest UTF-8 encoding of a single character.
const MAX_CHAR_WIDTH: usize = 4;

/// Width of the sequence started by `lead`, or 1 for bytes that start none.
fn sequence_width(lead: u8) -> usize {
    match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 1,
    }
}

/// Byte length and character count of at most `max_chars` leading characters.
fn char_prefix(text: &str, max_chars: usize) -> (usize, usize) {
    match text.char_indices().nth(max_chars) {
        Some((at, _)) => (at, max_chars),
        None => (text.len(), text.chars().count()),
    }
}

impl<S: Source> Input<S> {
    /// Decodes between `min` and `max` characters of UTF-8 text.
    ///
    /// Stops at `max` characters or at end of input. Fails with
    /// [`PacketError::EndOfData`] if the input ends before `min` characters
    /// were decoded, and with [`PacketError::MalformedInput`] on an invalid
    /// byte or a sequence truncated by end of input. Characters decoded
    /// before a failure stay consumed; the offending bytes do not.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    ///
    /// # Example
    ///
    /// ```
    /// use packetrs::Packet;
    ///
    /// let mut packet = Packet::copy_from_slice("Ɔ and more".as_bytes());
    /// assert_eq!(packet.read_text(1, 1)?, "Ɔ");
    /// assert_eq!(packet.read_text(0, usize::MAX)?, " and more");
    /// # Ok::<(), packetrs::PacketError>(())
    /// ```
    pub fn read_text(&mut self, min: usize, max: usize) -> Result<String> {
        let mut out = String::new();
        self.read_text_to(&mut out, min, max)?;
        Ok(out)
    }

    /// Like [`Input::read_text`], appending to `out`.
    ///
    /// Returns the number of characters appended.
    pub fn read_text_to(&mut self, out: &mut String, min: usize, max: usize) -> Result<usize> {
        assert!(min <= max, "min {min} exceeds max {max}");
        let mut decoded = 0usize;
        let mut pending = 0usize;
        if max > 0 {
            self.take_while_size(1, |window| {
                let bytes = window.as_slice();
                let (valid, needed) = match str::from_utf8(bytes) {
                    Ok(text) => (text, 0),
                    Err(e) => {
                        let valid = str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default();
                        match e.error_len() {
                            Some(_) if valid.is_empty() => {
                                return Err(PacketError::malformed(format!(
                                    "invalid byte 0x{:02x}",
                                    bytes[0]
                                )));
                            }
                            Some(_) => (valid, 0),
                            None => (valid, sequence_width(bytes[e.valid_up_to()])),
                        }
                    }
                };
                let (byte_len, chars) = char_prefix(valid, max - decoded);
                out.push_str(&valid[..byte_len]);
                decoded += chars;
                window.consume(byte_len);
                pending = 0;
                if decoded == max {
                    return Ok(0);
                }
                if needed > 0 && window.len() < needed {
                    pending = needed;
                    return Ok(needed);
                }
                Ok(1)
            })?;
        }
        if pending > 0 {
            let mut tail = [0u8; MAX_CHAR_WIDTH];
            let n = self.peek_to(&mut tail, 0, 0)?;
            let message = match str::from_utf8(&tail[..n]) {
                Err(e) if e.error_len().is_some() => format!(
                    "invalid continuation in sequence starting with 0x{:02x}",
                    tail[0]
                ),
                _ => format!("truncated sequence: {pending} byte(s) expected"),
            };
            return Err(PacketError::malformed(message));
        }
        if decoded < min {
            return Err(PacketError::end_of_data(min, decoded));
        }
        Ok(decoded)
    }

    /// Reads exactly `n` bytes and decodes them as UTF-8.
    pub fn read_text_exact_bytes(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| PacketError::malformed(format!("invalid text: {}", e.utf8_error())))
    }

    /// Reads one line of at most `limit` characters.
    ///
    /// A line ends at `\n`, `\r\n` or a lone `\r`; the terminator is consumed
    /// but not returned. The last line may end at end of input instead.
    /// Returns `None` if the input is already exhausted. Fails with
    /// [`PacketError::LimitExceeded`] if the line is longer than `limit`.
    ///
    /// # Example
    ///
    /// ```
    /// use packetrs::Packet;
    ///
    /// let mut packet = Packet::copy_from_slice(b"first\r\nsecond\nlast");
    /// assert_eq!(packet.read_utf8_line(80)?.as_deref(), Some("first"));
    /// assert_eq!(packet.read_utf8_line(80)?.as_deref(), Some("second"));
    /// assert_eq!(packet.read_utf8_line(80)?.as_deref(), Some("last"));
    /// assert_eq!(packet.read_utf8_line(80)?, None);
    /// # Ok::<(), packetrs::PacketError>(())
    /// ```
    pub fn read_utf8_line(&mut self, limit: usize) -> Result<Option<String>> {
        if !self.prefetch(1)? {
            return Ok(None);
        }
        let line = self.read_limited_text(&[b'\r', b'\n'], limit)?;
        match self.try_peek()? {
            Some(b'\n') => {
                self.discard(1)?;
            }
            Some(b'\r') => {
                self.discard(1)?;
                if self.try_peek()? == Some(b'\n') {
                    self.discard(1)?;
                }
            }
            _ => {}
        }
        Ok(Some(line))
    }

    /// Decodes text up to any of `delimiters`, which stay unread.
    ///
    /// Fails with [`PacketError::LimitExceeded`] if more than `limit`
    /// characters precede the delimiter.
    ///
    /// # Panics
    ///
    /// Panics if a delimiter is not ASCII.
    pub fn read_utf8_until_delimiter(&mut self, delimiters: &[u8], limit: usize) -> Result<String> {
        assert!(
            delimiters.is_ascii(),
            "text delimiters must be ASCII bytes"
        );
        self.read_limited_text(delimiters, limit)
    }

    /// Collects bytes up to a delimiter and decodes them.
    ///
    /// Any line of `limit` characters fits in `limit * 4` bytes, so a scan
    /// that fills that many bytes with more non-delimiter data behind them
    /// has necessarily seen too many characters.
    fn read_limited_text(&mut self, delimiters: &[u8], limit: usize) -> Result<String> {
        let cap = limit.saturating_mul(MAX_CHAR_WIDTH);
        let mut bytes = Vec::new();
        let is_delimiter = |b: u8| delimiters.contains(&b);
        self.scan_until(is_delimiter, cap, |part| bytes.extend_from_slice(part))?;
        if bytes.len() == cap {
            if let Some(next) = self.try_peek()? {
                if !is_delimiter(next) {
                    return Err(PacketError::LimitExceeded { limit });
                }
            }
        }
        let text = String::from_utf8(bytes)
            .map_err(|e| PacketError::malformed(format!("invalid text: {}", e.utf8_error())))?;
        if text.chars().count() > limit {
            return Err(PacketError::LimitExceeded { limit });
        }
        Ok(text)
    }
}
