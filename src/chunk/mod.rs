//! Chunk types.
//!
//! - [`Chunk`] - Fixed-capacity region with read/write cursors and gaps
//! - [`ByteOrder`] - Big or little endian encoding
//! - [`Primitive`] - Fixed-width values read and written by chunks

mod buffer;
mod primitive;

pub use buffer::Chunk;
pub use primitive::{ByteOrder, MAX_PRIMITIVE_WIDTH, Primitive};
