use super::Runtime;
use crate::{DispatchQueue, ResourcePool};
use core::{future::Future, pin::Pin, time::Duration};

/// A [`Runtime`] backed by Smol's global executor and `async-io` timers.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmolRuntime;

impl Runtime for SmolRuntime {
    /// `Timer` resolves to an `Instant`, so it is wrapped to produce `()`.
    type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn sleep_for(dur: Duration) -> Self::Sleep {
        Box::pin(async move {
            smol::Timer::after(dur).await;
        })
    }

    fn spawn<F>(future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        smol::spawn(future).detach();
    }
}

/// A [`ResourcePool`] driven by [`SmolRuntime`].
pub type SmolResourcePool<W> = ResourcePool<W, SmolRuntime>;

/// A [`DispatchQueue`] driven by [`SmolRuntime`].
pub type SmolDispatchQueue<Req, W> = DispatchQueue<Req, W, SmolRuntime>;
