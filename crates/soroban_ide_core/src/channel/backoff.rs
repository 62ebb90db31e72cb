//! Delay before reconnecting the live channel.

use std::time::Duration;

use rand::Rng;

/// Delay used by the default fixed policy.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// How long to wait after a close before connecting again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Same delay after every close.
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`, then jittered into the
    /// upper half of that window.
    ExponentialJitter {
        /// Delay after the first close.
        base: Duration,
        /// Upper bound for any delay.
        max: Duration,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Fixed(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect `attempt` (1 for the first close after a
    /// successful connection).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            ReconnectPolicy::Fixed(delay) => delay,
            ReconnectPolicy::ExponentialJitter { base, max } => {
                let ceiling = Self::ceiling(base, max, attempt);
                let millis = ceiling.as_millis() as u64;
                if millis < 2 {
                    return ceiling;
                }
                Duration::from_millis(rand::thread_rng().gen_range(millis / 2..=millis))
            }
        }
    }

    /// Upper bound of the delay for `attempt`, before jitter.
    pub fn ceiling(base: Duration, max: Duration, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        base.saturating_mul(1u32 << exponent).min(max)
    }
}
