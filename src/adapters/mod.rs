//! Bridges between `std::io` and the packet traits.
//!
//! - [`ReaderSource`] - Any [`Read`] as an input [`Source`]
//! - [`WriterSink`] - Any [`Write`] as an output [`Sink`]

use std::io::{self, Read, Write};

use crate::input::Source;
use crate::output::Sink;

/// Pulls input from a [`Read`] implementation.
///
/// Interrupted reads are retried. Closing the source only marks it closed;
/// the reader itself is dropped with the input.
///
/// # Example
///
/// ```
/// use packetrs::{ByteOrder, Input, ReaderSource, default_pool};
///
/// let bytes: &[u8] = &[0, 0, 0, 42, b'\n'];
/// let mut input = Input::new(ReaderSource::new(bytes), default_pool());
/// assert_eq!(input.read_u32(ByteOrder::BigEndian)?, 42);
/// assert_eq!(input.read_utf8_line(16)?.as_deref(), Some(""));
/// assert!(input.end_of_input()?);
/// # Ok::<(), packetrs::PacketError>(())
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    closed: bool,
}

impl<R: Read> ReaderSource<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    /// The wrapped reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns true once the input closed this source.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<R: Read> Source for ReaderSource<R> {
    fn fill(&mut self, destination: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(destination) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                result => return result,
            }
        }
    }

    fn close_source(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Pushes output to a [`Write`] implementation.
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    /// Wraps `inner`.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// The wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn flush(&mut self, source: &[u8]) -> io::Result<()> {
        self.inner.write_all(source)
    }

    fn close_destination(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
