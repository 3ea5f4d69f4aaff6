//! Cooldown-based pool of exclusive worker handles.
//!
//! A [`ResourcePool`] owns one [`Worker`] per configured endpoint. Consumers
//! check workers out with [`ResourcePool::acquire`] and return them with
//! [`ResourcePool::release`], which keeps the worker out of circulation for a
//! cooldown delay before routing it onward.
//!
//! ## Handoff rules
//!
//! - `acquire` takes an idle worker immediately when one exists. Otherwise it
//!   registers as a waiter and suspends.
//! - Waiters are served strictly in registration order.
//! - A worker whose cooldown elapses goes straight to the oldest waiter. It
//!   only enters the available set when no waiter exists at that moment. The
//!   check happens when the timer fires, not when `release` is called.
//!
//! A pool built from an empty list never resolves `acquire`. Callers are
//! responsible for configuring at least one worker.

use super::state::PoolState;
use crate::{ForeignWorker, PoolStats, Runtime, Worker, WorkerId, WorkerState};
use core::{
    fmt,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use futures::channel::oneshot;
use parking_lot::Mutex;
use std::sync::Arc;

/// A fixed set of interchangeable workers with exclusive checkout and
/// cooldown-delayed return.
///
/// Cloning is cheap and yields another handle to the same pool.
pub struct ResourcePool<W, R> {
    shared: Arc<Mutex<PoolState<W>>>,
    _runtime: PhantomData<fn() -> R>,
}

impl<W, R> ResourcePool<W, R>
where
    W: Send + 'static,
    R: Runtime,
{
    /// Creates a pool holding one worker per handle.
    ///
    /// Workers receive [`WorkerId`]s in iteration order and start out
    /// available.
    pub fn new(handles: impl IntoIterator<Item = W>) -> Self {
        let state = PoolState::new(handles);

        #[cfg(feature = "tracing")]
        tracing::debug!(capacity = state.capacity(), "resource pool created");

        Self {
            shared: Arc::new(Mutex::new(state)),
            _runtime: PhantomData,
        }
    }

    /// Checks out a worker, waiting for one if none is idle.
    ///
    /// Concurrent callers are served in the order they started waiting.
    /// Dropping the returned future gives up the caller's place in line. A
    /// worker that was already routed to it goes to the next waiter instead.
    pub fn acquire(&self) -> Acquire<'_, W> {
        Acquire {
            shared: &self.shared,
            waiter: None,
        }
    }

    /// Checks out an idle worker without waiting.
    ///
    /// Returns `None` if every worker is checked out or cooling down.
    pub fn try_acquire(&self) -> Option<Worker<W>> {
        self.shared.lock().take_available()
    }

    /// Returns `worker` to the pool after `delay`.
    ///
    /// The worker is cooling down until the delay elapses. At that point it is
    /// handed to the oldest waiter, or made available if nobody is waiting.
    /// Each call schedules exactly one such transition.
    ///
    /// # Errors
    ///
    /// Returns [`ForeignWorker`] without touching either pool if `worker` was
    /// checked out of a different pool.
    pub fn release(&self, worker: Worker<W>, delay: Duration) -> Result<(), ForeignWorker<W>> {
        if !self.shared.lock().owns(&worker) {
            #[cfg(feature = "tracing")]
            tracing::warn!(worker = %worker.id(), "refusing release of a worker from another pool");

            return Err(ForeignWorker::new(worker));
        }
        self.schedule_return(worker, delay);
        Ok(())
    }

    /// Starts the cooldown of a worker known to belong to this pool.
    pub(crate) fn schedule_return(&self, worker: Worker<W>, delay: Duration) {
        let id = worker.id();
        self.shared.lock().begin_cooldown(id);

        #[cfg(feature = "tracing")]
        tracing::debug!(worker = %id, ?delay, "cooldown scheduled");

        let cooldown = Cooldown {
            shared: Arc::clone(&self.shared),
            worker: Some(worker),
        };
        R::spawn(async move {
            R::sleep_for(delay).await;
            cooldown.finish();
        });
    }
}

impl<W, R> ResourcePool<W, R> {
    /// Returns the number of workers the pool was built with.
    pub fn capacity(&self) -> usize {
        self.shared.lock().capacity()
    }

    /// Returns where the worker with `id` currently is in its lifecycle.
    pub fn state_of(&self, id: WorkerId) -> Option<WorkerState> {
        self.shared.lock().state_of(id)
    }

    /// Returns a consistent snapshot of the pool's counters.
    pub fn stats(&self) -> PoolStats {
        self.shared.lock().stats()
    }

    /// Resets the peak checked-out counter to the current value.
    pub fn reset_peak(&self) {
        self.shared.lock().reset_peak();
    }
}

impl<W, R> Clone for ResourcePool<W, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _runtime: PhantomData,
        }
    }
}

impl<W, R> fmt::Debug for ResourcePool<W, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("ResourcePool")
            .field(
                "checked_out",
                &format_args!("{}/{}", stats.checked_out, stats.capacity),
            )
            .field("cooling_down", &stats.cooling_down)
            .field("waiting", &stats.waiting)
            .finish()
    }
}

/// Future returned by [`ResourcePool::acquire`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Acquire<'a, W> {
    shared: &'a Mutex<PoolState<W>>,
    waiter: Option<oneshot::Receiver<Worker<W>>>,
}

impl<W> Future for Acquire<'_, W> {
    type Output = Worker<W>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        loop {
            let Some(waiter) = this.waiter.as_mut() else {
                let mut state = this.shared.lock();
                if let Some(worker) = state.take_available() {
                    return Poll::Ready(worker);
                }
                let (tx, rx) = oneshot::channel();
                state.push_waiter(tx);
                this.waiter = Some(rx);

                #[cfg(feature = "tracing")]
                tracing::trace!("no idle worker, waiting for handoff");

                continue;
            };

            match Pin::new(waiter).poll(cx) {
                Poll::Ready(Ok(worker)) => {
                    this.waiter = None;
                    return Poll::Ready(worker);
                }
                // The sender only disappears without sending if the pool is
                // torn down. Register again rather than fail.
                Poll::Ready(Err(oneshot::Canceled)) => this.waiter = None,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<W> Drop for Acquire<'_, W> {
    fn drop(&mut self) {
        let Some(mut waiter) = self.waiter.take() else {
            return;
        };
        // Close first so no new handoff can land, then reclaim one that
        // already did.
        waiter.close();
        if let Ok(Some(worker)) = waiter.try_recv() {
            self.shared.lock().hand_off(worker);
        }
    }
}

impl<W> fmt::Debug for Acquire<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acquire")
            .field("waiting", &self.waiter.is_some())
            .finish()
    }
}

/// A scheduled return of one worker to its pool.
///
/// If the timer task is dropped before it fires, for example during runtime
/// shutdown, the worker is handed off immediately instead of being lost.
struct Cooldown<W> {
    shared: Arc<Mutex<PoolState<W>>>,
    worker: Option<Worker<W>>,
}

impl<W> Cooldown<W> {
    fn finish(mut self) {
        self.hand_off();
    }

    fn hand_off(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.shared.lock().hand_off(worker);
        }
    }
}

impl<W> Drop for Cooldown<W> {
    fn drop(&mut self) {
        self.hand_off();
    }
}
