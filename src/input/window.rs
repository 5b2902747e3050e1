//! Contiguous windows over the head chunk.

use super::{Input, Source};
use crate::chunk::{ByteOrder, Chunk, Primitive};
use crate::error::Result;

/// A contiguous run of readable bytes at the front of an [`Input`].
///
/// Bytes consumed through the window are consumed from the input once the
/// callback returns.
pub struct Window<'a> {
    chunk: &'a mut Chunk,
    consumed: usize,
}

impl<'a> Window<'a> {
    fn new(chunk: &'a mut Chunk) -> Self {
        Self { chunk, consumed: 0 }
    }

    /// The unconsumed bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.chunk.readable()
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.chunk.read_remaining()
    }

    /// Returns true if every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        !self.chunk.can_read()
    }

    /// Consumes `n` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`Window::len`].
    pub fn consume(&mut self, n: usize) {
        assert!(
            n <= self.len(),
            "cannot consume {n} byte(s) from a window of {}",
            self.len()
        );
        self.chunk.advance(n);
        self.consumed += n;
    }

    /// Reads one fixed-width value from the window.
    pub fn read_primitive<T: Primitive>(&mut self, order: ByteOrder) -> Result<T> {
        let value = self.chunk.read_primitive(order)?;
        self.consumed += T::WIDTH;
        Ok(value)
    }
}

impl<S: Source> Input<S> {
    /// Hands contiguous windows to `visit` until it asks for `0` bytes.
    ///
    /// `visit` receives a window of at least `initial` bytes and returns how
    /// many contiguous bytes it needs next. Bytes spread over several chunks
    /// are stitched into one, so a window never straddles a boundary. The
    /// loop also ends when fewer bytes than requested remain; whatever the
    /// callback left unconsumed stays readable.
    ///
    /// A callback that consumes nothing while asking for no more than it
    /// was given loops forever.
    ///
    /// Fails with [`WindowTooLarge`](crate::PacketError::WindowTooLarge) if a
    /// requested size exceeds the capacity of a pooled chunk.
    ///
    /// # Example
    ///
    /// ```
    /// use packetrs::{ByteOrder, Packet};
    ///
    /// // Length-prefixed records: [len: u8][payload; len]
    /// let mut packet = Packet::copy_from_slice(&[2, b'h', b'i', 1, b'!']);
    /// let mut records = Vec::new();
    /// packet.take_while_size(1, |window| {
    ///     let len = window.as_slice()[0] as usize;
    ///     if window.len() < 1 + len {
    ///         return Ok(1 + len);
    ///     }
    ///     window.consume(1);
    ///     records.push(window.as_slice()[..len].to_vec());
    ///     window.consume(len);
    ///     Ok(1)
    /// })?;
    /// assert_eq!(records, vec![b"hi".to_vec(), b"!".to_vec()]);
    /// # Ok::<(), packetrs::PacketError>(())
    /// ```
    pub fn take_while_size<F>(&mut self, initial: usize, mut visit: F) -> Result<()>
    where
        F: FnMut(&mut Window<'_>) -> Result<usize>,
    {
        let mut size = initial;
        while size > 0 {
            if !self.prepare_head(size)? {
                break;
            }
            let Some(head) = self.chain.front_mut() else {
                break;
            };
            let mut window = Window::new(head);
            let next = visit(&mut window);
            let consumed = window.consumed;
            self.after_head_read(consumed);
            size = next?;
        }
        Ok(())
    }

    /// Hands each buffered chunk to `visit` as a window, pulling more as needed.
    ///
    /// The walk moves on to the next chunk only if `visit` returned true and
    /// consumed the whole window; otherwise it stops.
    pub fn take_while<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&mut Window<'_>) -> Result<bool>,
    {
        loop {
            if !self.prefetch(1)? {
                return Ok(());
            }
            let Some(head) = self.chain.front_mut() else {
                return Ok(());
            };
            let mut window = Window::new(head);
            let proceed = visit(&mut window);
            let drained = window.is_empty();
            let consumed = window.consumed;
            self.after_head_read(consumed);
            if !(proceed? && drained) {
                return Ok(());
            }
        }
    }
}
