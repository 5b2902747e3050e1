//! Async packet streams.
//!
//! Reads through the `futures-io::AsyncRead` trait, so any runtime works:
//! tokio (through `tokio_util::compat`), async-std, smol and others.
//!
//! - [`packet_stream`] - Turns an async reader into a stream of packets
//!
//! This module requires the `async-io` feature to be enabled.

mod stream;

pub use stream::{PacketStream, packet_stream};
