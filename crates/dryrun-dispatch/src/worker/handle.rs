use core::fmt;
use portable_atomic::{AtomicU64, Ordering};

/// Stable identity of a worker within its pool.
///
/// Ids are assigned from the position of each endpoint in the configuration
/// list and never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(usize);

impl WorkerId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the position of the worker in the configuration list.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Identity of the pool a worker was created by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PoolId(u64);

impl PoolId {
    /// Returns an id no other pool in this process holds.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A checked-out worker.
///
/// Only a [`ResourcePool`](crate::ResourcePool) creates these, and each one
/// must go back to the pool it came from through
/// [`ResourcePool::release`](crate::ResourcePool::release). The type is
/// neither `Clone` nor `Copy`: releasing consumes it, so the same checkout
/// cannot be returned twice. Each worker also remembers its pool, and a
/// release into any other pool is refused.
pub struct Worker<W> {
    pool: PoolId,
    id: WorkerId,
    handle: W,
}

impl<W> Worker<W> {
    pub(crate) const fn new(pool: PoolId, id: WorkerId, handle: W) -> Self {
        Self { pool, id, handle }
    }

    pub(crate) const fn pool(&self) -> PoolId {
        self.pool
    }

    /// Returns the worker's identity.
    pub const fn id(&self) -> WorkerId {
        self.id
    }

    /// Returns the endpoint handle.
    pub const fn handle(&self) -> &W {
        &self.handle
    }
}

impl<W> fmt::Debug for Worker<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker").field("id", &self.id).finish()
    }
}
