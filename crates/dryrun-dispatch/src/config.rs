use core::time::Duration;

/// Cooldown applied when no explicit value is configured.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(500);

/// Settings for a [`DispatchQueue`](crate::DispatchQueue).
///
/// The cooldown is the mandatory pause between a worker finishing one
/// invocation and becoming eligible for the next. It is applied uniformly to
/// every release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatchConfig {
    /// Delay before a used worker can be handed out again.
    pub cooldown: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl DispatchConfig {
    /// Creates a configuration with the given cooldown.
    pub const fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    /// Replaces the cooldown.
    #[must_use]
    pub const fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}
