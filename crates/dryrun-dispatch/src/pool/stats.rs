/// A point-in-time snapshot of a [`ResourcePool`](crate::ResourcePool).
///
/// `available + checked_out + cooling_down` always equals `capacity`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of workers the pool was built with.
    pub capacity: usize,
    /// Workers that can be acquired without waiting.
    pub available: usize,
    /// Workers currently handed out to a consumer.
    pub checked_out: usize,
    /// Released workers whose cooldown has not elapsed yet.
    pub cooling_down: usize,
    /// Consumers suspended in `acquire()`.
    pub waiting: usize,
    /// Highest `checked_out` value observed since creation or the last reset.
    pub peak_checked_out: usize,
}
