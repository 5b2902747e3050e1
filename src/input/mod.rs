//! The read side: chunk chains consumed front to back.
//!
//! - [`Input`] - A chain of chunks plus a [`Source`] it pulls more bytes from
//! - [`Packet`] - An `Input` over a fixed chain with nothing left to pull
//! - [`Window`] - A contiguous view handed to [`Input::take_while_size`]
//!
//! Reads are spread over several submodules:
//!
//! - `read` - Primitives, byte slices, discards and peeks
//! - `scan` - Delimiter scans
//! - `text` - UTF-8 text and line decoding
//! - `window` - Contiguous windows and chunk iteration
//! - `std_io` - `std::io::Read`, `std::io::BufRead` and `bytes::Buf`

mod read;
mod scan;
mod std_io;
mod text;
mod window;

use std::collections::VecDeque;
use std::fmt;
use std::io;

use tracing::{debug, trace};

use crate::builder::Builder;
use crate::chunk::Chunk;
use crate::error::{PacketError, Result};
use crate::pool::{ChunkPool, default_pool};

pub use window::Window;

/// Where an [`Input`] pulls bytes from once its buffered chain runs dry.
pub trait Source {
    /// Writes up to `destination.len()` bytes into `destination`.
    ///
    /// Returns the number of bytes written; `0` means the source is exhausted.
    fn fill(&mut self, destination: &mut [u8]) -> io::Result<usize>;

    /// Releases the underlying resource.
    ///
    /// Called exactly once: the first time [`Source::fill`] returns `0`, or
    /// when the input is closed, whichever happens first.
    fn close_source(&mut self) -> io::Result<()>;
}

/// A source that is always exhausted. Backs [`Packet`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl Source for Detached {
    fn fill(&mut self, _destination: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }

    fn close_source(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A finished, read-only sequence of bytes spread over pooled chunks.
///
/// Produced by [`Builder::build`]. Reading consumes bytes from the front and
/// returns drained chunks to the pool; dropping a packet returns the rest.
pub type Packet = Input<Detached>;

/// A readable chain of chunks, refilled on demand from a [`Source`].
///
/// Bytes are consumed from the head chunk. When a read needs more bytes than
/// are buffered, the input borrows a chunk from its pool and asks the source
/// to fill it. Values that straddle a chunk boundary are reassembled
/// transparently, so a multi-byte read behaves the same whatever the chunk
/// layout.
///
/// # Example
///
/// ```
/// use packetrs::{ByteOrder, Builder};
///
/// let mut builder = Builder::default();
/// builder.write_u32(0xCAFE_BABE, ByteOrder::BigEndian);
/// builder.write_text("tail");
/// let mut packet = builder.build();
///
/// assert_eq!(packet.read_u32(ByteOrder::BigEndian)?, 0xCAFE_BABE);
/// assert_eq!(packet.read_text(0, usize::MAX)?, "tail");
/// assert!(packet.is_empty());
/// # Ok::<(), packetrs::PacketError>(())
/// ```
pub struct Input<S> {
    chain: VecDeque<Chunk>,
    remaining: usize,
    pool: ChunkPool,
    source: S,
    exhausted: bool,
    source_closed: bool,
}

impl<S> Input<S> {
    /// Number of buffered bytes not yet consumed.
    ///
    /// For a [`Packet`] this is the whole remaining size. For an input with
    /// a live source more bytes may still arrive.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Returns true if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Returns true if at least one byte is buffered.
    pub fn can_read(&self) -> bool {
        self.remaining > 0
    }

    /// Returns true if at least `n` bytes are buffered.
    pub fn has_bytes(&self, n: usize) -> bool {
        self.remaining >= n
    }

    /// The pool chunks are borrowed from and returned to.
    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }

    /// The source this input pulls from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns every buffered chunk to the pool.
    pub fn release(&mut self) {
        let released = self.chain.len();
        while let Some(chunk) = self.chain.pop_front() {
            chunk.release(&*self.pool);
        }
        self.remaining = 0;
        if released > 0 {
            trace!(released, "input released chunks");
        }
    }

    /// Records that `n` bytes were consumed from the head chunk and
    /// returns the head to the pool once drained.
    fn after_head_read(&mut self, n: usize) {
        self.remaining -= n;
        if self.chain.front().is_some_and(|head| !head.can_read()) {
            if let Some(drained) = self.chain.pop_front() {
                drained.release(&*self.pool);
            }
        }
    }

    /// Hands up to `n` buffered bytes to `sink` one chunk run at a time,
    /// consuming them. Never pulls from the source.
    pub(crate) fn drain_buffered<K: FnMut(&[u8])>(&mut self, n: usize, mut sink: K) -> usize {
        let mut drained = 0;
        while drained < n {
            let Some(head) = self.chain.front_mut() else {
                break;
            };
            let k = head.read_remaining().min(n - drained);
            sink(&head.readable()[..k]);
            head.advance(k);
            drained += k;
            self.after_head_read(k);
        }
        drained
    }

    /// Copies up to `destination.len()` buffered bytes without pulling.
    fn copy_out(&mut self, destination: &mut [u8]) -> usize {
        let mut at = 0;
        self.drain_buffered(destination.len(), |part| {
            destination[at..at + part.len()].copy_from_slice(part);
            at += part.len();
        })
    }

    /// Skips up to `n` buffered bytes without pulling.
    fn skip_buffered(&mut self, n: usize) -> usize {
        self.drain_buffered(n, |_| {})
    }

    /// Removes the head chunk from the chain.
    pub(crate) fn pop_head(&mut self) -> Option<Chunk> {
        let head = self.chain.pop_front()?;
        self.remaining -= head.read_remaining();
        Some(head)
    }

    /// Removes every chunk from the chain.
    pub(crate) fn take_chain(&mut self) -> VecDeque<Chunk> {
        self.remaining = 0;
        std::mem::take(&mut self.chain)
    }
}

impl<S: Source> Input<S> {
    /// Creates an input that pulls from `source` into chunks from `pool`.
    pub fn new(source: S, pool: ChunkPool) -> Self {
        Self {
            chain: VecDeque::new(),
            remaining: 0,
            pool,
            source,
            exhausted: false,
            source_closed: false,
        }
    }

    /// Returns true once nothing is buffered and the source is exhausted.
    ///
    /// May pull from the source to find out.
    pub fn end_of_input(&mut self) -> Result<bool> {
        Ok(!self.prefetch(1)?)
    }

    /// Releases buffered chunks and closes the source.
    ///
    /// The source is closed at most once across `close` calls and exhaustion.
    pub fn close(&mut self) -> Result<()> {
        self.release();
        self.exhausted = true;
        self.close_source_once()
    }

    /// Pulls from the source until at least `min` bytes are buffered.
    ///
    /// Returns false if the source ran out first.
    pub(crate) fn prefetch(&mut self, min: usize) -> Result<bool> {
        while self.remaining < min {
            if !self.fill_next()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Appends one freshly filled chunk. Returns false once the source is exhausted.
    pub(crate) fn fill_next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let mut chunk = self.pool.borrow();
        let filled = match self.source.fill(chunk.writable_mut()) {
            Ok(filled) => filled,
            Err(e) => {
                chunk.release(&*self.pool);
                return Err(e.into());
            }
        };
        if filled == 0 {
            chunk.release(&*self.pool);
            self.exhausted = true;
            self.close_source_once()?;
            return Ok(false);
        }
        chunk.commit_written(filled);
        trace!(filled, "filled chunk from source");
        self.remaining += filled;
        self.chain.push_back(chunk);
        Ok(true)
    }

    fn close_source_once(&mut self) -> Result<()> {
        if self.source_closed {
            return Ok(());
        }
        self.source_closed = true;
        debug!("closing input source");
        self.source.close_source()?;
        Ok(())
    }

    /// Makes the first `min` bytes contiguous in the head chunk.
    ///
    /// Returns false if fewer than `min` bytes are available in total.
    pub(crate) fn prepare_head(&mut self, min: usize) -> Result<bool> {
        if !self.prefetch(min)? {
            return Ok(false);
        }
        let head_len = self.chain.front().map_or(0, Chunk::read_remaining);
        if head_len < min {
            self.stitch_head(min)?;
        }
        Ok(true)
    }

    /// Moves bytes from following chunks into the head until it holds `min`.
    ///
    /// Uses the head's end gap when the head is exclusively owned and has
    /// room; otherwise the bytes are gathered in a fresh chunk.
    fn stitch_head(&mut self, min: usize) -> Result<()> {
        let Some(mut head) = self.chain.pop_front() else {
            return Ok(());
        };
        let missing = min - head.read_remaining();
        if head.is_exclusive() && head.capacity() - head.write_position() >= missing {
            head.release_end_gap();
        } else {
            let mut stitched = self.pool.borrow();
            stitched.release_end_gap();
            let max = stitched.capacity();
            if max < min {
                stitched.release(&*self.pool);
                self.chain.push_front(head);
                return Err(PacketError::WindowTooLarge { requested: min, max });
            }
            stitched.steal_from(&mut head, usize::MAX);
            head.release(&*self.pool);
            head = stitched;
        }
        while head.read_remaining() < min {
            let Some(next) = self.chain.front_mut() else {
                break;
            };
            head.steal_from(next, min - head.read_remaining());
            if !next.can_read() {
                if let Some(drained) = self.chain.pop_front() {
                    drained.release(&*self.pool);
                }
            }
        }
        trace!(min, "stitched head chunk");
        self.chain.push_front(head);
        Ok(())
    }
}

impl Packet {
    /// Wraps a finished chain. Empty chunks are returned to `pool`.
    pub(crate) fn from_chain(chain: VecDeque<Chunk>, pool: ChunkPool) -> Self {
        let mut kept = VecDeque::with_capacity(chain.len());
        for chunk in chain {
            if chunk.can_read() {
                kept.push_back(chunk);
            } else {
                chunk.release(&*pool);
            }
        }
        let remaining = kept.iter().map(Chunk::read_remaining).sum();
        Self {
            chain: kept,
            remaining,
            pool,
            source: Detached,
            exhausted: true,
            source_closed: true,
        }
    }

    /// An empty packet on the default pool.
    pub fn empty() -> Self {
        Self::empty_in(default_pool())
    }

    /// An empty packet on `pool`.
    pub fn empty_in(pool: ChunkPool) -> Self {
        Self::from_chain(VecDeque::new(), pool)
    }

    /// A packet holding a copy of `data`, on the default pool.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self::copy_from_slice_in(data, default_pool())
    }

    /// A packet holding a copy of `data`, on `pool`.
    pub fn copy_from_slice_in(data: &[u8], pool: ChunkPool) -> Self {
        let mut builder = Builder::new(pool);
        builder.write_fully(data);
        builder.build()
    }

    /// A second packet over the same unread bytes with its own cursor.
    ///
    /// Chunk payloads are shared, not duplicated. Reading or dropping either
    /// packet does not affect the other; a payload returns to the pool only
    /// after every packet holding it has released it.
    ///
    /// # Example
    ///
    /// ```
    /// use packetrs::Packet;
    ///
    /// let mut original = Packet::copy_from_slice(b"abc");
    /// let mut copy = original.copy();
    ///
    /// original.discard(3)?;
    /// assert!(original.is_empty());
    /// assert_eq!(copy.read_text(0, usize::MAX)?, "abc");
    /// # Ok::<(), packetrs::PacketError>(())
    /// ```
    pub fn copy(&self) -> Packet {
        Self {
            chain: self.chain.iter().map(Chunk::share).collect(),
            remaining: self.remaining,
            pool: self.pool.clone(),
            source: Detached,
            exhausted: true,
            source_closed: true,
        }
    }

    /// Number of chunks in the chain.
    pub fn chunk_count(&self) -> usize {
        self.chain.len()
    }
}

impl<S> Drop for Input<S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<S> fmt::Debug for Input<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("remaining", &self.remaining)
            .field("chunks", &self.chain.len())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
