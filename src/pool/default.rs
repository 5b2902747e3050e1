//! Bounded free-list pool.

use crossbeam_queue::ArrayQueue;

use super::ObjectPool;
use crate::chunk::Chunk;
use crate::config::PoolConfig;

/// Lifecycle hooks a [`DefaultPool`] calls on its instances.
pub trait InstanceFactory<T>: Send + Sync {
    /// Creates a new instance when the free list is empty.
    fn produce(&self) -> T;

    /// Resets a recycled instance before it is handed out again.
    fn clear(&self, instance: T) -> T {
        instance
    }

    /// Checks an instance being recycled. Panics on foreign or corrupt ones.
    fn validate(&self, _instance: &T) {}

    /// Disposes an instance the free list has no room for.
    fn dispose(&self, instance: T) {
        drop(instance);
    }
}

/// A bounded pool backed by a lock-free MPMC queue.
///
/// - `borrow` pops a free instance or produces one; it never blocks.
/// - `recycle` pushes the instance back, or disposes it when the queue is full.
/// - A pool with capacity `0` retains nothing and allocates on every borrow.
///
/// # Example
///
/// ```
/// use packetrs::{DefaultPool, ObjectPool, PoolConfig};
///
/// let pool = DefaultPool::chunks(PoolConfig::default().with_capacity(2));
/// let chunk = pool.borrow();
/// pool.recycle(chunk);
/// assert_eq!(pool.free_count(), 1);
/// pool.dispose();
/// assert_eq!(pool.free_count(), 0);
/// ```
pub struct DefaultPool<T, F> {
    free: Option<ArrayQueue<T>>,
    factory: F,
}

impl<T, F: InstanceFactory<T>> DefaultPool<T, F> {
    /// Creates a pool that retains at most `capacity` instances.
    pub fn new(capacity: usize, factory: F) -> Self {
        Self {
            free: (capacity > 0).then(|| ArrayQueue::new(capacity)),
            factory,
        }
    }

    /// Number of instances currently on the free list.
    pub fn free_count(&self) -> usize {
        self.free.as_ref().map_or(0, ArrayQueue::len)
    }

    /// The factory this pool produces instances with.
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl DefaultPool<Chunk, ChunkFactory> {
    /// Creates a chunk pool from a configuration.
    pub fn chunks(config: PoolConfig) -> Self {
        Self::new(config.capacity(), ChunkFactory::new(config))
    }
}

impl<T, F> ObjectPool<T> for DefaultPool<T, F>
where
    T: Send,
    F: InstanceFactory<T>,
{
    fn capacity(&self) -> usize {
        self.free.as_ref().map_or(0, ArrayQueue::capacity)
    }

    fn borrow(&self) -> T {
        match self.free.as_ref().and_then(ArrayQueue::pop) {
            Some(instance) => self.factory.clear(instance),
            None => {
                tracing::trace!("free list empty, producing new instance");
                self.factory.produce()
            }
        }
    }

    fn recycle(&self, instance: T) {
        self.factory.validate(&instance);
        let rejected = match &self.free {
            Some(free) => free.push(instance).err(),
            None => Some(instance),
        };
        if let Some(instance) = rejected {
            tracing::debug!(capacity = self.capacity(), "free list full, disposing instance");
            self.factory.dispose(instance);
        }
    }

    fn dispose(&self) {
        let mut disposed = 0usize;
        if let Some(free) = &self.free {
            while let Some(instance) = free.pop() {
                self.factory.dispose(instance);
                disposed += 1;
            }
        }
        tracing::debug!(disposed, "pool disposed");
    }
}

impl<T, F> std::fmt::Debug for DefaultPool<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultPool")
            .field("capacity", &self.free.as_ref().map_or(0, ArrayQueue::capacity))
            .field("free", &self.free.as_ref().map_or(0, ArrayQueue::len))
            .finish()
    }
}

/// Produces chunks of a fixed size with the configured end gap reserved.
#[derive(Debug, Clone, Copy)]
pub struct ChunkFactory {
    config: PoolConfig,
}

impl ChunkFactory {
    /// Creates a factory for the given configuration.
    pub fn new(config: PoolConfig) -> Self {
        Self { config }
    }

    /// The configuration chunks are produced with.
    pub fn config(&self) -> PoolConfig {
        self.config
    }
}

impl InstanceFactory<Chunk> for ChunkFactory {
    fn produce(&self) -> Chunk {
        let mut chunk = Chunk::new(self.config.chunk_size());
        chunk.reset_for_write_with(self.config.usable_size());
        chunk
    }

    fn clear(&self, mut chunk: Chunk) -> Chunk {
        chunk.reset_for_write_with(self.config.usable_size());
        chunk
    }

    fn validate(&self, chunk: &Chunk) {
        assert_eq!(
            chunk.capacity(),
            self.config.chunk_size(),
            "recycled chunk does not belong to this pool"
        );
        assert!(
            chunk.is_exclusive(),
            "recycled chunk is still shared with a packet copy"
        );
    }
}
