//! FIFO dispatch of caller requests onto a [`ResourcePool`].
//!
//! [`DispatchQueue::submit`] appends a request to the backlog and makes sure a
//! single drain loop is running. The drain loop repeatedly:
//!
//! 1. takes the oldest request, ending when there is none,
//! 2. waits until the pool yields a worker,
//! 3. starts the invocation in its own task and moves on.
//!
//! Each invocation task reports the outcome to its caller and then releases
//! the worker with the configured cooldown. A panicking invocation is caught,
//! reported as [`DispatchError::Abandoned`], and its worker released like any
//! other.
//!
//! Worker assignment follows submission order exactly. Completion order does
//! not, because invocations on different workers overlap.

use crate::{DispatchConfig, DispatchError, Invoke, ResourcePool, Result, Runtime, Worker};
use core::{
    fmt,
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    task::{Context, Poll},
};
use futures::{FutureExt, channel::oneshot};
use parking_lot::Mutex;
use portable_atomic::{AtomicU64, AtomicUsize, Ordering};
use std::{collections::VecDeque, sync::Arc};

type Reply<T, E> = oneshot::Sender<Result<T, E>>;

/// One submitted request waiting for a worker.
struct PendingRequest<Req, T, E> {
    request: Req,
    reply: Reply<T, E>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drain {
    Idle,
    Running,
    /// The loop holds the head of the backlog and is waiting for a worker.
    AwaitingWorker,
}

struct QueueState<Req, T, E> {
    backlog: VecDeque<PendingRequest<Req, T, E>>,
    drain: Drain,
}

struct Shared<Req, W, R>
where
    W: Invoke<Req>,
{
    pool: ResourcePool<W, R>,
    config: DispatchConfig,
    state: Mutex<QueueState<Req, W::Output, W::Error>>,
    dispatched: AtomicU64,
    in_flight: AtomicUsize,
}

/// Serializes requests from any number of callers against a
/// [`ResourcePool`].
///
/// Requests are assigned workers in the order they were submitted, and at most
/// one drain loop runs at a time. Cloning is cheap and yields another handle to
/// the same queue.
pub struct DispatchQueue<Req, W, R>
where
    W: Invoke<Req>,
{
    shared: Arc<Shared<Req, W, R>>,
}

impl<Req, W, R> DispatchQueue<Req, W, R>
where
    Req: Send + 'static,
    W: Invoke<Req>,
    R: Runtime,
{
    /// Binds a new, empty queue to `pool`.
    pub fn new(pool: ResourcePool<W, R>, config: DispatchConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                pool,
                config,
                state: Mutex::new(QueueState {
                    backlog: VecDeque::new(),
                    drain: Drain::Idle,
                }),
                dispatched: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Submits `request` and returns a future that resolves to its outcome.
    ///
    /// The request joins the backlog as soon as this method returns, before
    /// the future is first polled. Dropping the future does not withdraw the
    /// request. It is still dispatched in turn, and its outcome is discarded.
    ///
    /// # Errors
    ///
    /// Resolves to [`DispatchError::Invocation`] with the worker's own error if
    /// the invocation fails, and to [`DispatchError::Abandoned`] if it panics.
    pub fn submit(&self, request: Req) -> Submission<W::Output, W::Error> {
        let (reply, outcome) = oneshot::channel();

        let start_drain = {
            let mut state = self.shared.state.lock();
            state.backlog.push_back(PendingRequest { request, reply });
            let idle = state.drain == Drain::Idle;
            if idle {
                state.drain = Drain::Running;
            }
            idle
        };

        if start_drain {
            #[cfg(feature = "tracing")]
            tracing::debug!("drain loop started");

            R::spawn(drain(Arc::clone(&self.shared)));
        }

        Submission { outcome }
    }
}

impl<Req, W, R> DispatchQueue<Req, W, R>
where
    W: Invoke<Req>,
{
    /// Returns the pool this queue dispatches onto.
    pub fn pool(&self) -> &ResourcePool<W, R> {
        &self.shared.pool
    }

    /// Returns the queue's configuration.
    pub fn config(&self) -> DispatchConfig {
        self.shared.config
    }

    /// Returns the number of requests still waiting for a worker.
    pub fn pending(&self) -> usize {
        let state = self.shared.state.lock();
        state.backlog.len() + usize::from(state.drain == Drain::AwaitingWorker)
    }

    /// Returns `true` while a drain loop is active.
    pub fn is_draining(&self) -> bool {
        self.shared.state.lock().drain != Drain::Idle
    }

    /// Returns the number of invocations that have started and not finished.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Returns the total number of requests handed to a worker so far.
    pub fn dispatched(&self) -> u64 {
        self.shared.dispatched.load(Ordering::Acquire)
    }
}

impl<Req, W, R> Clone for DispatchQueue<Req, W, R>
where
    W: Invoke<Req>,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<Req, W, R> fmt::Debug for DispatchQueue<Req, W, R>
where
    W: Invoke<Req>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("pending", &self.pending())
            .field("draining", &self.is_draining())
            .field("in_flight", &self.in_flight())
            .field("pool", &self.shared.pool)
            .finish()
    }
}

/// Pairs backlog entries with workers until the backlog is empty.
async fn drain<Req, W, R>(shared: Arc<Shared<Req, W, R>>)
where
    Req: Send + 'static,
    W: Invoke<Req>,
    R: Runtime,
{
    loop {
        let pending = {
            let mut state = shared.state.lock();
            let Some(pending) = state.backlog.pop_front() else {
                state.drain = Drain::Idle;

                #[cfg(feature = "tracing")]
                tracing::debug!("drain loop finished, backlog empty");

                return;
            };
            state.drain = Drain::AwaitingWorker;
            pending
        };

        let worker = shared.pool.acquire().await;
        shared.state.lock().drain = Drain::Running;

        dispatch(&shared, worker, pending);
    }
}

/// Starts one invocation in its own task.
fn dispatch<Req, W, R>(
    shared: &Arc<Shared<Req, W, R>>,
    worker: Worker<W>,
    pending: PendingRequest<Req, W::Output, W::Error>,
) where
    Req: Send + 'static,
    W: Invoke<Req>,
    R: Runtime,
{
    let _seq = shared.dispatched.fetch_add(1, Ordering::AcqRel);
    shared.in_flight.fetch_add(1, Ordering::AcqRel);

    #[cfg(feature = "tracing")]
    tracing::debug!(worker = %worker.id(), request = _seq, "dispatching");

    let shared = Arc::clone(shared);
    R::spawn(async move {
        let PendingRequest { request, reply } = pending;
        let invocation = async { worker.handle().invoke(request).await };

        let outcome = match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(outcome) => outcome.map_err(DispatchError::Invocation),
            Err(_panic) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(worker = %worker.id(), "invocation panicked, releasing worker");

                Err(DispatchError::Abandoned)
            }
        };

        if reply.send(outcome).is_err() {
            #[cfg(feature = "tracing")]
            tracing::trace!(worker = %worker.id(), "caller gone, outcome discarded");
        }

        shared.in_flight.fetch_sub(1, Ordering::AcqRel);
        shared.pool.schedule_return(worker, shared.config.cooldown);
    });
}

/// Future returned by [`DispatchQueue::submit`].
///
/// Resolves once the request has been dispatched and its invocation has
/// finished.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Submission<T, E> {
    outcome: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for Submission<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.outcome).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // The reply sender was dropped without an outcome, for example
            // when the runtime shut down first.
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(DispatchError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> fmt::Debug for Submission<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission").finish_non_exhaustive()
    }
}
