//! Primitive, byte and skip reads.

use bytes::Bytes;

use super::{Input, Source};
use crate::chunk::{ByteOrder, MAX_PRIMITIVE_WIDTH, Primitive};
use crate::error::{PacketError, Result};

macro_rules! read_ordered {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Reads one `", stringify!($ty), "` in the given byte order.")]
            pub fn $name(&mut self, order: ByteOrder) -> Result<$ty> {
                self.read_primitive::<$ty>(order)
            }
        )*
    };
}

impl<S: Source> Input<S> {
    /// Reads one fixed-width value, stitching it across chunks if needed.
    ///
    /// Fails with [`PacketError::EndOfData`] without consuming anything if
    /// fewer than `T::WIDTH` bytes are available.
    pub fn read_primitive<T: Primitive>(&mut self, order: ByteOrder) -> Result<T> {
        if !self.prefetch(T::WIDTH)? {
            return Err(PacketError::end_of_data(T::WIDTH, self.remaining));
        }
        if let Some(head) = self.chain.front_mut() {
            if head.read_remaining() >= T::WIDTH {
                let value = head.read_primitive(order)?;
                self.after_head_read(T::WIDTH);
                return Ok(value);
            }
        }
        let mut scratch = [0u8; MAX_PRIMITIVE_WIDTH];
        self.copy_out(&mut scratch[..T::WIDTH]);
        Ok(T::decode(&scratch[..T::WIDTH], order))
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_primitive(ByteOrder::BigEndian)
    }

    /// Reads one signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_primitive(ByteOrder::BigEndian)
    }

    read_ordered! {
        read_u16 => u16,
        read_i16 => i16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
        read_f32 => f32,
        read_f64 => f64,
    }

    /// Fills `destination` with consecutive values in the given byte order.
    ///
    /// Fails with [`PacketError::EndOfData`] without consuming anything if
    /// fewer than `destination.len() * T::WIDTH` bytes are available.
    ///
    /// # Example
    ///
    /// ```
    /// use packetrs::{Builder, ByteOrder};
    ///
    /// let mut builder = Builder::default();
    /// builder.write_primitives(&[1u32, 2, 3], ByteOrder::LittleEndian);
    /// let mut packet = builder.build();
    ///
    /// let mut values = [0u32; 3];
    /// packet.read_fully_primitives(&mut values, ByteOrder::LittleEndian)?;
    /// assert_eq!(values, [1, 2, 3]);
    /// # Ok::<(), packetrs::PacketError>(())
    /// ```
    pub fn read_fully_primitives<T: Primitive>(
        &mut self,
        destination: &mut [T],
        order: ByteOrder,
    ) -> Result<()> {
        let needed = destination.len().saturating_mul(T::WIDTH);
        if !self.prefetch(needed)? {
            return Err(PacketError::end_of_data(needed, self.remaining));
        }
        for slot in destination.iter_mut() {
            *slot = self.read_primitive(order)?;
        }
        Ok(())
    }

    /// Reads as many whole values as are available, up to `destination.len()`.
    ///
    /// Returns the number of values read. Trailing bytes too few for one more
    /// value stay unread.
    pub fn read_available_primitives<T: Primitive>(
        &mut self,
        destination: &mut [T],
        order: ByteOrder,
    ) -> Result<usize> {
        let mut read = 0;
        for slot in destination.iter_mut() {
            if !self.prefetch(T::WIDTH)? {
                break;
            }
            *slot = self.read_primitive(order)?;
            read += 1;
        }
        Ok(read)
    }

    /// Fills `destination` completely.
    ///
    /// Fails with [`PacketError::EndOfData`] without consuming anything if
    /// fewer bytes are available.
    pub fn read_fully(&mut self, destination: &mut [u8]) -> Result<()> {
        if !self.prefetch(destination.len())? {
            return Err(PacketError::end_of_data(destination.len(), self.remaining));
        }
        self.copy_out(destination);
        Ok(())
    }

    /// Copies as many bytes as are available, up to `destination.len()`.
    ///
    /// Pulls from the source until `destination` is full or the source is
    /// exhausted. Returns the number of bytes copied.
    pub fn read_available(&mut self, destination: &mut [u8]) -> Result<usize> {
        let mut copied = self.copy_out(destination);
        while copied < destination.len() && self.fill_next()? {
            copied += self.copy_out(&mut destination[copied..]);
        }
        Ok(copied)
    }

    /// Reads exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        if !self.prefetch(n)? {
            return Err(PacketError::end_of_data(n, self.remaining));
        }
        let mut out = vec![0u8; n];
        self.copy_out(&mut out);
        Ok(Bytes::from(out))
    }

    /// Reads at least `min` and at most `max` bytes.
    ///
    /// Fails with [`PacketError::EndOfData`] without consuming anything if
    /// fewer than `min` bytes are available.
    pub fn read_bytes_of(&mut self, min: usize, max: usize) -> Result<Bytes> {
        assert!(min <= max, "min {min} exceeds max {max}");
        if !self.prefetch(min)? {
            return Err(PacketError::end_of_data(min, self.remaining));
        }
        let mut out = Vec::with_capacity(self.remaining.min(max));
        while out.len() < max {
            if self.remaining == 0 && !self.fill_next()? {
                break;
            }
            let Some(head) = self.chain.front_mut() else {
                break;
            };
            let n = head.read_remaining().min(max - out.len());
            out.extend_from_slice(&head.readable()[..n]);
            head.advance(n);
            self.after_head_read(n);
        }
        Ok(Bytes::from(out))
    }

    /// Reads everything until the source is exhausted.
    pub fn read_remaining_bytes(&mut self) -> Result<Bytes> {
        self.read_bytes_of(0, usize::MAX)
    }

    /// Skips up to `n` bytes. Returns the number actually skipped.
    pub fn discard(&mut self, n: usize) -> Result<usize> {
        let mut skipped = self.skip_buffered(n);
        while skipped < n && self.fill_next()? {
            skipped += self.skip_buffered(n - skipped);
        }
        Ok(skipped)
    }

    /// Skips exactly `n` bytes.
    ///
    /// If fewer are available, everything is skipped and
    /// [`PacketError::EndOfData`] reports how many were.
    pub fn discard_exact(&mut self, n: usize) -> Result<()> {
        let skipped = self.discard(n)?;
        if skipped < n {
            return Err(PacketError::end_of_data(n, skipped));
        }
        Ok(())
    }

    /// The next byte, without consuming it. `None` at end of input.
    pub fn try_peek(&mut self) -> Result<Option<u8>> {
        if !self.prefetch(1)? {
            return Ok(None);
        }
        Ok(self.chain.front().and_then(|head| head.try_peek_byte()))
    }

    /// Copies bytes starting `offset` bytes ahead into `destination` without
    /// consuming anything.
    ///
    /// Pulls until `offset + min` bytes are buffered if possible, then copies
    /// as many buffered bytes as fit. Returns the number copied, which may be
    /// less than `min` at end of input.
    pub fn peek_to(&mut self, destination: &mut [u8], offset: usize, min: usize) -> Result<usize> {
        self.prefetch(offset.saturating_add(min))?;
        let mut skip = offset;
        let mut copied = 0;
        for chunk in &self.chain {
            if copied == destination.len() {
                break;
            }
            let readable = chunk.readable();
            if skip >= readable.len() {
                skip -= readable.len();
                continue;
            }
            let part = &readable[skip..];
            skip = 0;
            let n = part.len().min(destination.len() - copied);
            destination[copied..copied + n].copy_from_slice(&part[..n]);
            copied += n;
        }
        Ok(copied)
    }
}
