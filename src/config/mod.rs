//! Configuration for chunk pools.
//!
//! - [`PoolConfig`] - Chunk size, free-list bound and reserved end gap
//!
//! # Example
//!
//! ```
//! use packetrs::PoolConfig;
//!
//! let config = PoolConfig::new(1024, 16, 8)?;
//! assert_eq!(config.usable_size(), 1016);
//!
//! let config = PoolConfig::default()
//!     .with_chunk_size(8192)
//!     .with_capacity(64);
//! config.validate()?;
//! # Ok::<(), packetrs::PacketError>(())
//! ```

use crate::chunk::MAX_PRIMITIVE_WIDTH;
use crate::error::PacketError;

/// Default chunk size (4 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Default number of chunks a pool keeps on its free list.
pub const DEFAULT_POOL_CAPACITY: usize = 1000;

/// Bytes kept free at the tail of every pooled chunk for stitching.
pub const RESERVED_SIZE: usize = 8;

/// Configuration for a chunk pool.
///
/// - `chunk_size` - Capacity of every chunk the pool produces
/// - `capacity` - How many released chunks the free list retains (0 = none)
/// - `reserved` - End gap reserved on chunks handed to builders and sources
///
/// Constraint: `chunk_size - reserved >= 8`, so that the widest primitive
/// always fits into the writable part of a fresh chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolConfig {
    chunk_size: usize,
    capacity: usize,
    reserved: usize,
}

impl PoolConfig {
    /// Creates a new configuration.
    ///
    /// Returns error if the chunk cannot hold the reserved gap plus one
    /// primitive.
    pub fn new(chunk_size: usize, capacity: usize, reserved: usize) -> Result<Self, PacketError> {
        if chunk_size == 0 {
            return Err(PacketError::InvalidConfig {
                message: "chunk_size must be non-zero",
            });
        }

        if reserved >= chunk_size {
            return Err(PacketError::InvalidConfig {
                message: "reserved gap must be smaller than chunk_size",
            });
        }

        if chunk_size - reserved < MAX_PRIMITIVE_WIDTH {
            return Err(PacketError::InvalidConfig {
                message: "chunk_size minus reserved gap must fit an 8-byte primitive",
            });
        }

        Ok(Self {
            chunk_size,
            capacity,
            reserved,
        })
    }

    /// Sets the chunk size. Does not validate.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the free-list capacity. Does not validate.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the reserved end gap. Does not validate.
    pub fn with_reserved(mut self, reserved: usize) -> Self {
        self.reserved = reserved;
        self
    }

    /// Returns the chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the free-list capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the reserved end gap.
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Bytes writable in a fresh chunk once the end gap is reserved.
    pub fn usable_size(&self) -> usize {
        self.chunk_size.saturating_sub(self.reserved)
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), PacketError> {
        Self::new(self.chunk_size, self.capacity, self.reserved).map(|_| ())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            capacity: DEFAULT_POOL_CAPACITY,
            reserved: RESERVED_SIZE,
        }
    }
}
