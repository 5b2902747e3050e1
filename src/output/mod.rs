//! The push side: a builder that drains into a [`Sink`].

use std::fmt;
use std::io;

use tracing::debug;

use crate::builder::Builder;
use crate::error::Result;
use crate::input::Packet;
use crate::pool::ChunkPool;

/// Where an [`Output`] pushes buffered bytes.
pub trait Sink {
    /// Writes all of `source` to the destination.
    fn flush(&mut self, source: &[u8]) -> io::Result<()>;

    /// Releases the destination. Called at most once, by [`Output::close`].
    fn close_destination(&mut self) -> io::Result<()>;
}

/// Buffers writes in pooled chunks and pushes them to a [`Sink`] on flush.
///
/// # Example
///
/// ```
/// use packetrs::{ByteOrder, Output, WriterSink, default_pool};
///
/// let mut output = Output::new(WriterSink::new(Vec::new()), default_pool());
/// output.buffer_mut().write_u16(7, ByteOrder::BigEndian);
/// output.buffer_mut().write_text("ok");
/// output.flush()?;
///
/// assert_eq!(output.sink().get_ref(), &[0, 7, b'o', b'k']);
/// # Ok::<(), packetrs::PacketError>(())
/// ```
pub struct Output<K> {
    buffer: Builder,
    sink: K,
    closed: bool,
}

impl<K: Sink> Output<K> {
    /// Creates an output that buffers in chunks from `pool`.
    pub fn new(sink: K, pool: ChunkPool) -> Self {
        Self {
            buffer: Builder::new(pool),
            sink,
            closed: false,
        }
    }

    /// The pending bytes. Written through to the sink on [`Output::flush`].
    pub fn buffer_mut(&mut self) -> &mut Builder {
        &mut self.buffer
    }

    /// Number of bytes written but not yet flushed.
    pub fn buffered(&self) -> usize {
        self.buffer.size()
    }

    /// The sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutable access to the sink.
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Pushes every buffered byte to the sink, chunk by chunk.
    ///
    /// Flushed chunks go back to the pool even when the sink fails.
    pub fn flush(&mut self) -> Result<()> {
        let pending = self.buffer.build();
        self.drain(pending)
    }

    /// Flushes the buffer, then pushes `packet` after it.
    pub fn send(&mut self, packet: Packet) -> Result<()> {
        self.flush()?;
        self.drain(packet)
    }

    /// Flushes and closes the sink. Later calls do nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let flushed = self.flush();
        self.buffer.reset();
        debug!("closing output sink");
        let closed = self.sink.close_destination();
        flushed?;
        closed?;
        Ok(())
    }

    fn drain(&mut self, mut packet: Packet) -> Result<()> {
        let pool = packet.pool().clone();
        while let Some(chunk) = packet.pop_head() {
            let written = self.sink.flush(chunk.readable());
            chunk.release(&*pool);
            written?;
        }
        Ok(())
    }
}

impl<K: Sink> io::Write for Output<K> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write_fully(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Output::flush(self)?;
        Ok(())
    }
}

impl<K> fmt::Debug for Output<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("buffered", &self.buffer.size())
            .field("closed", &self.closed)
            .finish()
    }
}
