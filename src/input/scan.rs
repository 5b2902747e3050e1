//! Delimiter scans. The delimiter itself is never consumed.

use super::{Input, Source};
use crate::builder::Builder;
use crate::error::Result;

impl<S: Source> Input<S> {
    /// Walks up to `max` bytes, handing each run before the first delimiter
    /// to `sink` and consuming it. Returns the number of bytes consumed.
    pub(super) fn scan_until<M, K>(&mut self, is_delimiter: M, max: usize, mut sink: K) -> Result<usize>
    where
        M: Fn(u8) -> bool,
        K: FnMut(&[u8]),
    {
        let mut total = 0;
        while total < max {
            if !self.prefetch(1)? {
                break;
            }
            let Some(head) = self.chain.front_mut() else {
                break;
            };
            let readable = head.readable();
            let limit = readable.len().min(max - total);
            let (n, found) = match readable[..limit].iter().position(|&b| is_delimiter(b)) {
                Some(at) => (at, true),
                None => (limit, false),
            };
            sink(&readable[..n]);
            head.advance(n);
            self.after_head_read(n);
            total += n;
            if found {
                break;
            }
        }
        Ok(total)
    }

    /// Copies bytes into `destination` until `delimiter` or until it is full.
    ///
    /// Returns the number of bytes copied. The delimiter stays unread.
    ///
    /// # Example
    ///
    /// ```
    /// use packetrs::Packet;
    ///
    /// let mut packet = Packet::copy_from_slice(b"key=value");
    /// let mut key = [0u8; 16];
    /// let n = packet.read_until_delimiter(b'=', &mut key)?;
    /// assert_eq!(&key[..n], b"key");
    /// assert_eq!(packet.try_peek()?, Some(b'='));
    /// # Ok::<(), packetrs::PacketError>(())
    /// ```
    pub fn read_until_delimiter(&mut self, delimiter: u8, destination: &mut [u8]) -> Result<usize> {
        let max = destination.len();
        let mut at = 0;
        self.scan_until(|b| b == delimiter, max, |part| {
            destination[at..at + part.len()].copy_from_slice(part);
            at += part.len();
        })
    }

    /// Like [`Input::read_until_delimiter`], stopping at either delimiter.
    pub fn read_until_delimiters(
        &mut self,
        first: u8,
        second: u8,
        destination: &mut [u8],
    ) -> Result<usize> {
        let max = destination.len();
        let mut at = 0;
        self.scan_until(|b| b == first || b == second, max, |part| {
            destination[at..at + part.len()].copy_from_slice(part);
            at += part.len();
        })
    }

    /// Appends bytes to `out` until `delimiter` or end of input.
    pub fn read_until_delimiter_to(&mut self, delimiter: u8, out: &mut Builder) -> Result<usize> {
        self.scan_until(|b| b == delimiter, usize::MAX, |part| out.write_fully(part))
    }

    /// Like [`Input::read_until_delimiter_to`], stopping at either delimiter.
    pub fn read_until_delimiters_to(
        &mut self,
        first: u8,
        second: u8,
        out: &mut Builder,
    ) -> Result<usize> {
        self.scan_until(|b| b == first || b == second, usize::MAX, |part| {
            out.write_fully(part)
        })
    }

    /// Skips bytes until `delimiter` or end of input. Returns the number skipped.
    pub fn discard_until_delimiter(&mut self, delimiter: u8) -> Result<usize> {
        self.scan_until(|b| b == delimiter, usize::MAX, |_| {})
    }

    /// Skips bytes until either delimiter or end of input.
    pub fn discard_until_delimiters(&mut self, first: u8, second: u8) -> Result<usize> {
        self.scan_until(|b| b == first || b == second, usize::MAX, |_| {})
    }
}
