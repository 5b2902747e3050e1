//! Chunk pooling.
//!
//! - [`ObjectPool`] - Borrow/recycle contract shared by all pools
//! - [`DefaultPool`] - Bounded lock-free free list with allocate-on-empty and
//!   drop-on-full semantics
//! - [`VerifyingPool`] - Leak and double-release detector for tests
//!   (feature `verify`)
//!
//! Every [`Packet`](crate::Packet), [`Builder`](crate::Builder) and
//! [`Input`](crate::Input) holds a [`ChunkPool`] handle and returns its
//! chunks there when they are consumed, released or dropped.

mod default;
#[cfg(feature = "verify")]
mod verifying;

use std::sync::{Arc, OnceLock};

use crate::chunk::Chunk;
use crate::config::PoolConfig;

pub use default::{ChunkFactory, DefaultPool, InstanceFactory};
#[cfg(feature = "verify")]
pub use verifying::{Tracked, VerifyingChunkPool, VerifyingPool};

/// An allocator and recycler of reusable instances.
///
/// Implementations must be safe to call concurrently and must never block:
/// `borrow` allocates when nothing is free and `recycle` drops the instance
/// when the free list is full.
pub trait ObjectPool<T>: Send + Sync {
    /// Maximum number of instances retained on the free list.
    fn capacity(&self) -> usize;

    /// Takes a free instance or produces a new one.
    fn borrow(&self) -> T;

    /// Returns an instance. It must not be used by the caller afterwards.
    fn recycle(&self, instance: T);

    /// Drains and disposes every retained instance.
    fn dispose(&self);
}

/// Shared handle to a chunk pool.
pub type ChunkPool = Arc<dyn ObjectPool<Chunk>>;

/// The process-wide chunk pool built from [`PoolConfig::default`].
///
/// # Example
///
/// ```
/// use packetrs::default_pool;
///
/// let pool = default_pool();
/// let chunk = pool.borrow();
/// assert_eq!(chunk.capacity(), 4096);
/// chunk.release(&*pool);
/// ```
pub fn default_pool() -> ChunkPool {
    static DEFAULT: OnceLock<ChunkPool> = OnceLock::new();
    DEFAULT
        .get_or_init(|| Arc::new(DefaultPool::chunks(PoolConfig::default())))
        .clone()
}
