//! packetrs
//!
//! Pooled, chunked binary I/O buffers.
//!
//! `packetrs` keeps bytes in fixed-size chunks borrowed from a pool and
//! threads them into chains. Writers append to a [`Builder`], which finishes
//! into a read-only [`Packet`]; readers consume packets, or any [`Input`]
//! refilled on demand from a [`Source`]. Chunks go back to their pool as soon
//! as they are drained, so steady-state traffic allocates nothing.
//!
//! Reads are boundary-agnostic: fixed-width values, UTF-8 characters and
//! windows requested through [`Input::take_while_size`] are reassembled when
//! they straddle two chunks.
//!
//! The crate intentionally:
//! - does NOT do any network or file I/O of its own
//! - does NOT decode character sets other than UTF-8
//! - does NOT share a single packet between threads
//!
//! # Write, then read
//!
//! ```
//! use packetrs::{Builder, ByteOrder, PacketError};
//!
//! fn main() -> Result<(), PacketError> {
//!     let mut builder = Builder::default();
//!     builder.write_u16(5, ByteOrder::BigEndian);
//!     builder.write_text("hello\n");
//!
//!     let mut packet = builder.build();
//!     let len = packet.read_u16(ByteOrder::BigEndian)?;
//!     let line = packet.read_utf8_line(80)?;
//!     assert_eq!(len, 5);
//!     assert_eq!(line.as_deref(), Some("hello"));
//!     Ok(())
//! }
//! ```
//!
//! # Reading from std
//!
//! ```no_run
//! use std::fs::File;
//! use packetrs::{Input, PacketError, ReaderSource, default_pool};
//!
//! fn main() -> Result<(), PacketError> {
//!     let file = File::open("lines.txt")?;
//!     let mut input = Input::new(ReaderSource::new(file), default_pool());
//!
//!     while let Some(line) = input.read_utf8_line(1024)? {
//!         println!("{line}");
//!     }
//!     input.close()
//! }
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use packetrs::{packet_stream, default_pool};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(reader: R) -> Result<(), packetrs::PacketError> {
//!     let mut stream = packet_stream(reader, default_pool());
//!
//!     while let Some(packet) = stream.next().await {
//!         let packet = packet?;
//!         println!("packet {} bytes", packet.remaining());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod adapters;
mod builder;
mod chunk;
mod config;
mod error;
mod input;
mod output;
mod pool;

#[cfg(feature = "async-io")]
mod async_stream;

//
// Public surface
//

pub use adapters::{ReaderSource, WriterSink};
pub use builder::Builder;
pub use chunk::{ByteOrder, Chunk, MAX_PRIMITIVE_WIDTH, Primitive};
pub use config::{DEFAULT_CHUNK_SIZE, DEFAULT_POOL_CAPACITY, PoolConfig, RESERVED_SIZE};
pub use error::{PacketError, Result};
pub use input::{Detached, Input, Packet, Source, Window};
pub use output::{Output, Sink};
pub use pool::{ChunkFactory, ChunkPool, DefaultPool, InstanceFactory, ObjectPool, default_pool};

#[cfg(feature = "verify")]
pub use pool::{Tracked, VerifyingChunkPool, VerifyingPool};

#[cfg(feature = "async-io")]
pub use async_stream::{PacketStream, packet_stream};
