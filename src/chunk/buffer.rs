//! The Chunk type - a fixed-capacity region with read and write cursors.

use std::fmt;
use std::sync::Arc;

use super::{ByteOrder, Primitive};
use crate::error::{PacketError, Result};
use crate::pool::ObjectPool;

/// Backing storage of a chunk. Shared read-only between copies of a packet.
struct Memory {
    bytes: Box<[u8]>,
}

/// A fixed-capacity memory region with independent read and write cursors.
///
/// Layout of the region:
///
/// ```text
/// 0        start_gap   read_position   write_position   limit      capacity
/// |--------|-----------|###############|----------------|----------|
///   start     consumed     readable        writable        end gap
/// ```
///
/// `0 <= start_gap <= read_position <= write_position <= limit <= capacity`
/// always holds. Values are never split across chunks here: a read or write
/// that does not fit is an error (reads) or a panic (writes). Stitching
/// values across chunk boundaries is done by [`Input`](crate::Input) and
/// [`Builder`](crate::Builder).
///
/// The payload is reference counted so that [`Packet::copy`](crate::Packet::copy)
/// can hand out independent cursors over the same bytes. Writing requires the
/// payload to be exclusively owned; writing into a shared payload panics.
///
/// # Example
///
/// ```
/// use packetrs::{ByteOrder, Chunk};
///
/// let mut chunk = Chunk::new(16);
/// chunk.write_primitive(0x0102u16, ByteOrder::BigEndian);
/// chunk.write_primitive(7u8, ByteOrder::BigEndian);
///
/// assert_eq!(chunk.read_remaining(), 3);
/// assert_eq!(chunk.read_primitive::<u16>(ByteOrder::BigEndian)?, 0x0102);
/// assert_eq!(chunk.try_peek_byte(), Some(7));
/// # Ok::<(), packetrs::PacketError>(())
/// ```
pub struct Chunk {
    memory: Arc<Memory>,
    read_position: usize,
    write_position: usize,
    start_gap: usize,
    limit: usize,
}

impl Chunk {
    /// Allocates a new blank chunk.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "chunk capacity must be non-zero");
        Self::from_memory(Arc::new(Memory {
            bytes: vec![0u8; capacity].into_boxed_slice(),
        }))
    }

    fn from_memory(memory: Arc<Memory>) -> Self {
        let limit = memory.bytes.len();
        Self {
            memory,
            read_position: 0,
            write_position: 0,
            start_gap: 0,
            limit,
        }
    }

    /// Total size of the region.
    pub fn capacity(&self) -> usize {
        self.memory.bytes.len()
    }

    /// Index of the next byte to read.
    pub fn read_position(&self) -> usize {
        self.read_position
    }

    /// Index of the next byte to write.
    pub fn write_position(&self) -> usize {
        self.write_position
    }

    /// Bytes reserved before the first readable byte.
    pub fn start_gap(&self) -> usize {
        self.start_gap
    }

    /// Bytes reserved after the writable region.
    pub fn end_gap(&self) -> usize {
        self.capacity() - self.limit
    }

    /// Exclusive end of the writable region.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of bytes available for reading.
    pub fn read_remaining(&self) -> usize {
        self.write_position - self.read_position
    }

    /// Number of bytes that can still be written before the end gap.
    pub fn write_remaining(&self) -> usize {
        self.limit - self.write_position
    }

    /// Returns true if at least one byte can be read.
    pub fn can_read(&self) -> bool {
        self.write_position > self.read_position
    }

    /// Returns true if at least one byte can be written.
    pub fn can_write(&self) -> bool {
        self.limit > self.write_position
    }

    /// Returns true if no other packet copy shares this payload.
    pub fn is_exclusive(&self) -> bool {
        Arc::strong_count(&self.memory) == 1
    }

    /// Identity of the underlying payload, stable across recycling.
    pub(crate) fn payload_id(&self) -> usize {
        self.memory.bytes.as_ptr() as usize
    }

    /// Clears both cursors and both gaps, making the full capacity writable.
    ///
    /// Any unread bytes are discarded.
    pub fn reset_for_write(&mut self) {
        let capacity = self.capacity();
        self.reset_for_write_with(capacity);
    }

    /// Clears both cursors and limits the writable region to `limit` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `limit` exceeds the capacity.
    pub fn reset_for_write_with(&mut self, limit: usize) {
        assert!(
            limit <= self.capacity(),
            "limit {limit} exceeds chunk capacity {}",
            self.capacity()
        );
        self.read_position = 0;
        self.write_position = 0;
        self.start_gap = 0;
        self.limit = limit;
    }

    /// Reserves `n` bytes at the head of an empty chunk.
    ///
    /// # Panics
    ///
    /// Panics if the chunk holds readable bytes or `n` exceeds the limit.
    pub fn reserve_start_gap(&mut self, n: usize) {
        assert!(
            !self.can_read(),
            "start gap can only be reserved on an empty chunk"
        );
        assert!(n <= self.limit, "start gap {n} exceeds limit {}", self.limit);
        self.start_gap = n;
        self.read_position = n;
        self.write_position = n;
    }

    /// Shrinks the writable region so that `n` bytes stay free at the tail.
    ///
    /// # Panics
    ///
    /// Panics if bytes were already written into that area.
    pub fn reserve_end_gap(&mut self, n: usize) {
        let capacity = self.capacity();
        assert!(n <= capacity, "end gap {n} exceeds capacity {capacity}");
        let new_limit = capacity - n;
        assert!(
            new_limit >= self.write_position,
            "end gap {n} overlaps {} written byte(s)",
            self.write_position - new_limit.min(self.write_position)
        );
        self.limit = new_limit;
    }

    /// Makes the reserved end gap writable again.
    pub fn release_end_gap(&mut self) {
        self.limit = self.capacity();
    }

    /// The readable bytes.
    pub fn readable(&self) -> &[u8] {
        &self.memory.bytes[self.read_position..self.write_position]
    }

    /// The writable bytes between the write cursor and the limit.
    ///
    /// # Panics
    ///
    /// Panics if the payload is shared with a packet copy.
    pub fn writable_mut(&mut self) -> &mut [u8] {
        let (start, end) = (self.write_position, self.limit);
        &mut self.memory_mut()[start..end]
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        match Arc::get_mut(&mut self.memory) {
            Some(memory) => &mut memory.bytes,
            None => panic!("chunk payload is shared with a packet copy and cannot be written"),
        }
    }

    /// Marks `n` bytes after the write cursor as written.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`Chunk::write_remaining`].
    pub fn commit_written(&mut self, n: usize) {
        assert!(
            n <= self.write_remaining(),
            "commit of {n} byte(s) exceeds {} writable",
            self.write_remaining()
        );
        self.write_position += n;
    }

    /// Skips exactly `n` readable bytes.
    pub fn discard_exact(&mut self, n: usize) -> Result<()> {
        if n > self.read_remaining() {
            return Err(PacketError::end_of_data(n, self.read_remaining()));
        }
        self.read_position += n;
        Ok(())
    }

    /// Skips `n` readable bytes the caller already knows are there.
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.read_remaining());
        self.read_position += n.min(self.read_remaining());
    }

    /// Returns the next readable byte without consuming it.
    pub fn try_peek_byte(&self) -> Option<u8> {
        self.readable().first().copied()
    }

    /// Fills `destination` entirely from the readable bytes.
    pub fn read_fully(&mut self, destination: &mut [u8]) -> Result<()> {
        let n = destination.len();
        if n > self.read_remaining() {
            return Err(PacketError::end_of_data(n, self.read_remaining()));
        }
        destination.copy_from_slice(&self.readable()[..n]);
        self.read_position += n;
        Ok(())
    }

    /// Appends all of `source`.
    ///
    /// # Panics
    ///
    /// Panics if `source` does not fit into [`Chunk::write_remaining`].
    pub fn write_fully(&mut self, source: &[u8]) {
        let n = source.len();
        assert!(
            n <= self.write_remaining(),
            "write of {n} byte(s) exceeds {} writable",
            self.write_remaining()
        );
        self.writable_mut()[..n].copy_from_slice(source);
        self.write_position += n;
    }

    /// Reads one fixed-width value in the given byte order.
    pub fn read_primitive<T: Primitive>(&mut self, order: ByteOrder) -> Result<T> {
        if self.read_remaining() < T::WIDTH {
            return Err(PacketError::end_of_data(T::WIDTH, self.read_remaining()));
        }
        let value = T::decode(self.readable(), order);
        self.read_position += T::WIDTH;
        Ok(value)
    }

    /// Appends one fixed-width value in the given byte order.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `T::WIDTH` bytes are writable.
    pub fn write_primitive<T: Primitive>(&mut self, value: T, order: ByteOrder) {
        assert!(
            self.write_remaining() >= T::WIDTH,
            "write of {} byte(s) exceeds {} writable",
            T::WIDTH,
            self.write_remaining()
        );
        value.encode(self.writable_mut(), order);
        self.write_position += T::WIDTH;
    }

    /// Moves up to `max` readable bytes of `source` into this chunk.
    ///
    /// Returns the number of bytes moved; both cursors advance.
    pub(crate) fn steal_from(&mut self, source: &mut Chunk, max: usize) -> usize {
        let n = max
            .min(source.read_remaining())
            .min(self.write_remaining());
        if n > 0 {
            self.writable_mut()[..n].copy_from_slice(&source.readable()[..n]);
            self.write_position += n;
            source.read_position += n;
        }
        n
    }

    /// Another view over the same payload with its own cursors.
    pub(crate) fn share(&self) -> Chunk {
        Chunk {
            memory: Arc::clone(&self.memory),
            read_position: self.read_position,
            write_position: self.write_position,
            start_gap: self.start_gap,
            limit: self.limit,
        }
    }

    /// Returns the chunk to `pool`.
    ///
    /// A chunk whose payload is still shared with another packet copy is
    /// only detached; the last holder returns the payload.
    pub fn release(mut self, pool: &dyn ObjectPool<Chunk>) {
        if Arc::get_mut(&mut self.memory).is_some() {
            pool.recycle(self);
            return;
        }
        if let Some(memory) = Arc::into_inner(self.memory) {
            pool.recycle(Chunk::from_memory(Arc::new(memory)));
        }
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("capacity", &self.capacity())
            .field("start_gap", &self.start_gap)
            .field("read_position", &self.read_position)
            .field("write_position", &self.write_position)
            .field("limit", &self.limit)
            .field("shared", &!self.is_exclusive())
            .finish()
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chunk({} readable, {} writable, cap {})",
            self.read_remaining(),
            self.write_remaining(),
            self.capacity()
        )
    }
}
