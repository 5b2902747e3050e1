//! Byte order and fixed-width primitive encoding.

use std::mem::size_of;

/// Widest primitive the crate encodes (u64/i64/f64).
pub const MAX_PRIMITIVE_WIDTH: usize = 8;

/// Byte order used to encode and decode multi-byte primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Most significant byte first (network order).
    #[default]
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

impl ByteOrder {
    /// The byte order of the current target.
    #[cfg(target_endian = "big")]
    pub const NATIVE: ByteOrder = ByteOrder::BigEndian;

    /// The byte order of the current target.
    #[cfg(target_endian = "little")]
    pub const NATIVE: ByteOrder = ByteOrder::LittleEndian;
}

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width value that can be read from and written to chunks.
///
/// Implemented for `u8 i8 u16 i16 u32 i32 u64 i64 f32 f64`.
pub trait Primitive: Copy + sealed::Sealed {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decodes a value from exactly `WIDTH` bytes.
    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    /// Encodes the value into exactly `WIDTH` bytes.
    fn encode(self, out: &mut [u8], order: ByteOrder);
}

macro_rules! impl_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Primitive for $ty {
                const WIDTH: usize = size_of::<$ty>();

                #[inline]
                fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                    let mut raw = [0u8; size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..size_of::<$ty>()]);
                    match order {
                        ByteOrder::BigEndian => <$ty>::from_be_bytes(raw),
                        ByteOrder::LittleEndian => <$ty>::from_le_bytes(raw),
                    }
                }

                #[inline]
                fn encode(self, out: &mut [u8], order: ByteOrder) {
                    let raw = match order {
                        ByteOrder::BigEndian => self.to_be_bytes(),
                        ByteOrder::LittleEndian => self.to_le_bytes(),
                    };
                    out[..size_of::<$ty>()].copy_from_slice(&raw);
                }
            }
        )*
    };
}

impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);
