use core::{future::Future, time::Duration};

/// Abstracts over the async runtime that drives the pool and queue.
///
/// The pool needs a timer for cooldowns, and both the pool and the queue need
/// to start detached tasks: cooldown releases, the drain loop and individual
/// invocations. Implementations exist for Tokio and Smol. Anything else can be
/// plugged in by implementing this trait.
pub trait Runtime: Send + Sync + 'static {
    /// We require `Send` so that the future can be safely moved across threads
    type Sleep: Future<Output = ()> + Send;

    /// Returns a future that completes once `dur` has elapsed.
    fn sleep_for(dur: Duration) -> Self::Sleep;

    /// Runs `future` to completion in the background. The task is detached and
    /// its completion is never awaited.
    fn spawn<F>(future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
