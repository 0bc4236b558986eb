//! Revive delay for failed connections.

use std::time::Duration;

/// How the revive delay grows with repeated failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevivePolicy {
    /// Always wait exactly the dead timeout.
    #[default]
    Flat,
    /// `base * 2^(failures - 1)`, capped.
    Exponential { max: Duration },
}

/// Delay before a connection with `consecutive_failures` failures (counting the
/// one just recorded) may be tried again.
pub fn revive_delay(consecutive_failures: u32, base: Duration, policy: RevivePolicy) -> Duration {
    match policy {
        RevivePolicy::Flat => base,
        RevivePolicy::Exponential { max } => {
            if consecutive_failures == 0 {
                return base.min(max);
            }
            let exponent = (consecutive_failures - 1).min(31);
            let factor = 2u32.saturating_pow(exponent);
            base.saturating_mul(factor).min(max)
        }
    }
}
