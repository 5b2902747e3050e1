//! Leak-detecting pool wrapper.

use std::collections::HashSet;
use std::marker::PhantomData;

use parking_lot::Mutex;

use super::{ChunkFactory, DefaultPool, ObjectPool};
use crate::chunk::Chunk;
use crate::config::PoolConfig;

/// Instances a [`VerifyingPool`] can tell apart.
pub trait Tracked {
    /// An identity that stays stable while the instance is pooled or borrowed.
    fn tracking_id(&self) -> usize;
}

impl Tracked for Chunk {
    fn tracking_id(&self) -> usize {
        self.payload_id()
    }
}

/// A verifying pool over the default chunk pool.
pub type VerifyingChunkPool = VerifyingPool<Chunk, DefaultPool<Chunk, ChunkFactory>>;

/// Wraps a pool and records every instance currently borrowed from it.
///
/// - Recycling an instance that is not currently borrowed (double release or
///   an instance from another pool) panics immediately.
/// - [`VerifyingPool::assert_empty`] panics if anything is still borrowed.
///
/// Meant for test teardown: build packets against it, release or consume
/// them, then call `assert_empty()`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use packetrs::{Builder, ChunkPool, PoolConfig, VerifyingChunkPool};
///
/// let pool = Arc::new(VerifyingChunkPool::chunks(PoolConfig::default()));
/// let mut builder = Builder::new(pool.clone() as ChunkPool);
/// builder.write_text("hello");
/// let mut packet = builder.build();
/// assert_eq!(packet.read_text(0, usize::MAX)?, "hello");
///
/// pool.assert_empty();
/// # Ok::<(), packetrs::PacketError>(())
/// ```
pub struct VerifyingPool<T, P> {
    inner: P,
    borrowed: Mutex<HashSet<usize>>,
    _instances: PhantomData<fn(T) -> T>,
}

impl<T, P: ObjectPool<T>> VerifyingPool<T, P> {
    /// Wraps `inner`.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            borrowed: Mutex::new(HashSet::new()),
            _instances: PhantomData,
        }
    }

    /// Number of instances borrowed and not yet recycled.
    pub fn borrowed_count(&self) -> usize {
        self.borrowed.lock().len()
    }

    /// Panics if any borrowed instance was never recycled.
    pub fn assert_empty(&self) {
        let outstanding = self.borrowed_count();
        if outstanding > 0 {
            tracing::debug!(outstanding, "verifying pool found leaked instances");
            panic!("{outstanding} pooled instance(s) were borrowed but never recycled");
        }
    }

    /// The wrapped pool.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl VerifyingChunkPool {
    /// A verifying pool over a fresh [`DefaultPool`] of chunks.
    pub fn chunks(config: PoolConfig) -> Self {
        Self::new(DefaultPool::chunks(config))
    }
}

impl<T, P> ObjectPool<T> for VerifyingPool<T, P>
where
    T: Tracked,
    P: ObjectPool<T>,
{
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn borrow(&self) -> T {
        let instance = self.inner.borrow();
        let fresh = self.borrowed.lock().insert(instance.tracking_id());
        assert!(fresh, "pool handed out an instance that is already borrowed");
        instance
    }

    fn recycle(&self, instance: T) {
        let known = self.borrowed.lock().remove(&instance.tracking_id());
        assert!(
            known,
            "recycled an instance that is not currently borrowed (double release or foreign instance)"
        );
        self.inner.recycle(instance);
    }

    fn dispose(&self) {
        self.inner.dispose();
    }
}

impl<T, P: std::fmt::Debug> std::fmt::Debug for VerifyingPool<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyingPool")
            .field("inner", &self.inner)
            .field("borrowed", &self.borrowed.lock().len())
            .finish()
    }
}
