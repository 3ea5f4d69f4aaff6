use crate::{PoolId, PoolStats, Worker, WorkerId};
use futures::channel::oneshot;
use std::collections::VecDeque;

/// The lifecycle position of a single worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Idle and ready to be acquired.
    Available,
    /// Handed out to a consumer.
    CheckedOut,
    /// Released, waiting for its cooldown to elapse.
    CoolingDown,
}

impl WorkerState {
    const fn slot(self) -> usize {
        match self {
            Self::Available => 0,
            Self::CheckedOut => 1,
            Self::CoolingDown => 2,
        }
    }
}

/// Everything the pool mutates, kept behind a single lock.
///
/// When `waiters` holds a live receiver, `available` is empty: a consumer only
/// registers as a waiter after finding nothing available, and a returning
/// worker is routed to the oldest live waiter before it can enter
/// `available`.
pub(crate) struct PoolState<W> {
    id: PoolId,
    available: VecDeque<Worker<W>>,
    waiters: VecDeque<oneshot::Sender<Worker<W>>>,
    states: Vec<WorkerState>,
    counts: [usize; 3],
    peak_checked_out: usize,
}

impl<W> PoolState<W> {
    pub(crate) fn new(handles: impl IntoIterator<Item = W>) -> Self {
        let id = PoolId::next();
        let available: VecDeque<_> = handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| Worker::new(id, WorkerId::new(index), handle))
            .collect();
        let capacity = available.len();

        Self {
            id,
            available,
            waiters: VecDeque::new(),
            states: vec![WorkerState::Available; capacity],
            counts: [capacity, 0, 0],
            peak_checked_out: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if `worker` was created by this pool.
    pub(crate) fn owns(&self, worker: &Worker<W>) -> bool {
        worker.pool() == self.id
    }

    pub(crate) fn state_of(&self, id: WorkerId) -> Option<WorkerState> {
        self.states.get(id.index()).copied()
    }

    /// Takes the head of the available set and marks it checked out.
    pub(crate) fn take_available(&mut self) -> Option<Worker<W>> {
        let worker = self.available.pop_front()?;
        self.transition(worker.id(), WorkerState::CheckedOut);

        #[cfg(feature = "tracing")]
        tracing::trace!(worker = %worker.id(), "acquired without waiting");

        Some(worker)
    }

    pub(crate) fn push_waiter(&mut self, waiter: oneshot::Sender<Worker<W>>) {
        self.waiters.push_back(waiter);
    }

    pub(crate) fn begin_cooldown(&mut self, id: WorkerId) {
        self.transition(id, WorkerState::CoolingDown);
    }

    /// Routes a returning worker to the oldest waiter that is still listening,
    /// or parks it in the available set when nobody is waiting.
    pub(crate) fn hand_off(&mut self, mut worker: Worker<W>) {
        let id = worker.id();

        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.send(worker) {
                Ok(()) => {
                    self.transition(id, WorkerState::CheckedOut);

                    #[cfg(feature = "tracing")]
                    tracing::trace!(worker = %id, "handed to waiter");

                    return;
                }
                // The waiter went away before being served.
                Err(returned) => worker = returned,
            }
        }

        self.transition(id, WorkerState::Available);
        self.available.push_back(worker);

        #[cfg(feature = "tracing")]
        tracing::trace!(worker = %id, "returned to available set");
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            available: self.counts[WorkerState::Available.slot()],
            checked_out: self.counts[WorkerState::CheckedOut.slot()],
            cooling_down: self.counts[WorkerState::CoolingDown.slot()],
            waiting: self.waiters.iter().filter(|w| !w.is_canceled()).count(),
            peak_checked_out: self.peak_checked_out,
        }
    }

    pub(crate) fn reset_peak(&mut self) {
        self.peak_checked_out = self.counts[WorkerState::CheckedOut.slot()];
    }

    fn transition(&mut self, id: WorkerId, to: WorkerState) {
        let from = core::mem::replace(&mut self.states[id.index()], to);
        self.counts[from.slot()] -= 1;
        self.counts[to.slot()] += 1;

        let checked_out = self.counts[WorkerState::CheckedOut.slot()];
        if checked_out > self.peak_checked_out {
            self.peak_checked_out = checked_out;
        }
    }
}
