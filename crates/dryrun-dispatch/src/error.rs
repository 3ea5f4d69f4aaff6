use crate::Worker;
use core::fmt;

/// A result type for dispatched requests, parameterized by the worker's own
/// error type.
pub type Result<T, E> = core::result::Result<T, DispatchError<E>>;

/// All outcomes a caller of [`DispatchQueue::submit`] can observe besides
/// success.
///
/// The queue and pool have no failure modes of their own. Every error a caller
/// sees originates in the invocation of the worker that served its request.
///
/// [`DispatchQueue::submit`]: crate::DispatchQueue::submit
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError<E> {
    /// The worker ran the request and reported a failure. The worker's error
    /// is passed through unchanged.
    #[error("worker invocation failed: {0}")]
    Invocation(E),

    /// The invocation ended without producing an outcome, which only happens
    /// if it panicked. The worker is still returned to the pool.
    #[error("request abandoned before the worker produced an outcome")]
    Abandoned,
}

impl<E> DispatchError<E> {
    /// Returns the worker's error, if this is an invocation failure.
    pub fn into_invocation(self) -> Option<E> {
        match self {
            Self::Invocation(e) => Some(e),
            Self::Abandoned => None,
        }
    }
}

/// Returned by [`ResourcePool::release`] when the worker was checked out of a
/// different pool. Neither pool is modified, and the worker is handed back.
///
/// [`ResourcePool::release`]: crate::ResourcePool::release
#[derive(thiserror::Error)]
#[error("{worker:?} does not belong to this pool")]
pub struct ForeignWorker<W> {
    worker: Worker<W>,
}

impl<W> ForeignWorker<W> {
    pub(crate) const fn new(worker: Worker<W>) -> Self {
        Self { worker }
    }

    /// Returns the refused worker, so it can go back to its own pool.
    pub fn into_worker(self) -> Worker<W> {
        self.worker
    }
}

impl<W> fmt::Debug for ForeignWorker<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignWorker")
            .field("worker", &self.worker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_wraps_worker_error() {
        let err: DispatchError<&str> = DispatchError::Invocation("endpoint unreachable");
        assert_eq!(
            err.to_string(),
            "worker invocation failed: endpoint unreachable"
        );
        assert_eq!(err.into_invocation(), Some("endpoint unreachable"));
    }

    #[test]
    fn foreign_worker_hands_the_worker_back() {
        use crate::{PoolId, WorkerId};

        let refused = ForeignWorker::new(Worker::new(PoolId::next(), WorkerId::new(2), "east"));
        assert_eq!(
            refused.to_string(),
            "Worker { id: WorkerId(2) } does not belong to this pool"
        );
        assert_eq!(*refused.into_worker().handle(), "east");
    }

    #[test]
    fn abandoned_has_no_worker_error() {
        let err: DispatchError<String> = DispatchError::Abandoned;
        assert!(err.to_string().contains("abandoned"));
        assert_eq!(err.into_invocation(), None);
    }
}
