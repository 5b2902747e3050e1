//! The write side: appending bytes into a growing chunk chain.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::trace;

use crate::chunk::{ByteOrder, Chunk, Primitive};
use crate::error::{PacketError, Result};
use crate::input::{Input, Packet, Source};
use crate::pool::{ChunkPool, default_pool};

macro_rules! write_ordered {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Appends one `", stringify!($ty), "` in the given byte order.")]
            pub fn $name(&mut self, value: $ty, order: ByteOrder) {
                self.write_primitive(value, order);
            }
        )*
    };
}

/// Accumulates written bytes in pooled chunks and finishes them as a [`Packet`].
///
/// Writes go to the tail chunk; a new chunk is borrowed whenever the tail is
/// full. Fixed-width values are never split: if the tail cannot hold the
/// whole value it is written to a fresh chunk. [`Builder::build`] hands the
/// chain over to a packet and leaves the builder empty and reusable.
///
/// Dropping a builder returns its chunks to the pool.
///
/// # Example
///
/// ```
/// use packetrs::{Builder, ByteOrder};
///
/// let mut builder = Builder::default();
/// builder.write_u16(2, ByteOrder::BigEndian);
/// builder.write_text("hi");
/// assert_eq!(builder.size(), 4);
///
/// let mut packet = builder.build();
/// assert_eq!(builder.size(), 0);
/// assert_eq!(packet.read_u16(ByteOrder::BigEndian)?, 2);
/// assert_eq!(packet.read_text(0, usize::MAX)?, "hi");
/// # Ok::<(), packetrs::PacketError>(())
/// ```
pub struct Builder {
    chain: VecDeque<Chunk>,
    size: usize,
    pool: ChunkPool,
}

impl Builder {
    /// Creates an empty builder borrowing chunks from `pool`.
    pub fn new(pool: ChunkPool) -> Self {
        Self {
            chain: VecDeque::new(),
            size: 0,
            pool,
        }
    }

    /// Number of bytes written since creation or the last build/reset.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The pool chunks are borrowed from.
    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }

    /// The tail chunk, replaced by a fresh one unless it can take `n` bytes.
    fn tail_for(&mut self, n: usize) -> &mut Chunk {
        let reusable = self
            .chain
            .back()
            .is_some_and(|tail| tail.is_exclusive() && tail.write_remaining() >= n);
        if !reusable {
            self.chain.push_back(self.pool.borrow());
        }
        let last = self.chain.len() - 1;
        &mut self.chain[last]
    }

    /// Appends one fixed-width value. The value never straddles two chunks.
    pub fn write_primitive<T: Primitive>(&mut self, value: T, order: ByteOrder) {
        self.tail_for(T::WIDTH).write_primitive(value, order);
        self.size += T::WIDTH;
    }

    /// Appends one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.write_primitive(value, ByteOrder::BigEndian);
    }

    /// Appends one signed byte.
    pub fn write_i8(&mut self, value: i8) {
        self.write_primitive(value, ByteOrder::BigEndian);
    }

    write_ordered! {
        write_u16 => u16,
        write_i16 => i16,
        write_u32 => u32,
        write_i32 => i32,
        write_u64 => u64,
        write_i64 => i64,
        write_f32 => f32,
        write_f64 => f64,
    }

    /// Appends every value of `values` in the given byte order.
    pub fn write_primitives<T: Primitive>(&mut self, values: &[T], order: ByteOrder) {
        for &value in values {
            self.write_primitive(value, order);
        }
    }

    /// Appends all of `source`, spreading it over as many chunks as needed.
    pub fn write_fully(&mut self, source: &[u8]) {
        let mut rest = source;
        while !rest.is_empty() {
            let tail = self.tail_for(1);
            let n = tail.write_remaining().min(rest.len());
            tail.write_fully(&rest[..n]);
            rest = &rest[n..];
        }
        self.size += source.len();
    }

    /// Appends `text` encoded as UTF-8.
    pub fn write_text(&mut self, text: &str) {
        self.write_fully(text.as_bytes());
    }

    /// Appends one character encoded as UTF-8.
    pub fn append_char(&mut self, c: char) {
        let mut encoded = [0u8; 4];
        self.write_fully(c.encode_utf8(&mut encoded).as_bytes());
    }

    /// Appends the whole of `packet`, consuming it.
    ///
    /// Chunks from the same pool are moved over rather than copied; a chunk
    /// small enough to fit the tail's free space is merged into it instead.
    /// Packets from another pool are copied and their chunks returned there.
    pub fn write_packet(&mut self, mut packet: Packet) {
        let packet_pool = Arc::clone(packet.pool());
        let same_pool = Arc::ptr_eq(&self.pool, &packet_pool);
        for chunk in packet.take_chain() {
            let n = chunk.read_remaining();
            let fits_tail = self
                .chain
                .back()
                .is_some_and(|tail| tail.is_exclusive() && tail.write_remaining() >= n);
            if same_pool && n > 0 && !fits_tail {
                self.size += n;
                self.chain.push_back(chunk);
            } else {
                self.write_fully(chunk.readable());
                chunk.release(&*packet_pool);
            }
        }
        trace!(size = self.size, same_pool, "appended packet");
    }

    /// Moves exactly `n` bytes from the front of `input` into this builder.
    ///
    /// Fails with [`PacketError::EndOfData`] without consuming anything if
    /// `input` holds fewer than `n` bytes.
    pub fn write_packet_exact<S: Source>(&mut self, input: &mut Input<S>, n: usize) -> Result<()> {
        if !input.prefetch(n)? {
            return Err(PacketError::end_of_data(n, input.remaining()));
        }
        input.drain_buffered(n, |part| self.write_fully(part));
        Ok(())
    }

    /// Finishes the written bytes as a packet and empties the builder.
    pub fn build(&mut self) -> Packet {
        self.size = 0;
        Packet::from_chain(std::mem::take(&mut self.chain), self.pool.clone())
    }

    /// A packet over the bytes written so far, leaving the builder untouched.
    ///
    /// Shares chunk payloads with the builder; further writes go to fresh
    /// chunks while the preview is alive.
    pub fn preview(&self) -> Packet {
        Packet::from_chain(
            self.chain.iter().filter(|c| c.can_read()).map(Chunk::share).collect(),
            self.pool.clone(),
        )
    }

    /// Discards everything written and returns the chunks to the pool.
    pub fn reset(&mut self) {
        while let Some(chunk) = self.chain.pop_front() {
            chunk.release(&*self.pool);
        }
        self.size = 0;
    }

    /// Discards the builder, returning its chunks to the pool.
    pub fn release(mut self) {
        self.reset();
    }
}

impl Default for Builder {
    /// A builder on the process-wide [`default_pool`].
    fn default() -> Self {
        Self::new(default_pool())
    }
}

impl Drop for Builder {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Write for Builder {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_text(s);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        self.append_char(c);
        Ok(())
    }
}

impl io::Write for Builder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_fully(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("size", &self.size)
            .field("chunks", &self.chain.len())
            .finish()
    }
}
