use super::Runtime;
use crate::{DispatchQueue, ResourcePool};
use core::{future::Future, time::Duration};

/// A [`Runtime`] backed by Tokio's timer and task spawner.
///
/// Must be used from within a Tokio runtime context. Timers follow Tokio's
/// clock, so tests can drive cooldowns deterministically with
/// `tokio::time::pause`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioRuntime;

impl Runtime for TokioRuntime {
    type Sleep = tokio::time::Sleep;

    fn sleep_for(dur: Duration) -> Self::Sleep {
        tokio::time::sleep(dur)
    }

    fn spawn<F>(future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        drop(tokio::spawn(future));
    }
}

/// A [`ResourcePool`] driven by [`TokioRuntime`].
pub type TokioResourcePool<W> = ResourcePool<W, TokioRuntime>;

/// A [`DispatchQueue`] driven by [`TokioRuntime`].
pub type TokioDispatchQueue<Req, W> = DispatchQueue<Req, W, TokioRuntime>;

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn sleep_follows_tokio_clock() {
        let began = Instant::now();
        TokioRuntime::sleep_for(Duration::from_secs(30)).await;
        assert!(began.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_task_runs_detached() {
        let (tx, rx) = futures::channel::oneshot::channel();
        TokioRuntime::spawn(async move {
            let _ = tx.send(7);
        });
        assert_eq!(rx.await, Ok(7));
    }
}
