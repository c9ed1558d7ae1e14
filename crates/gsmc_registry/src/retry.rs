//! Bounded retry policy for rate-limited registry requests.

use std::time::Duration;

/// Default number of attempts before a request is reported unreachable.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default grace period added on top of the server-announced reset delay.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(1);

/// How often and how long the client waits when the registry quota is depleted.
///
/// The policy holds no counters; every request observes the headers of its own
/// responses and asks the policy how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub grace: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            grace: DEFAULT_GRACE,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, grace: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            grace,
        }
    }

    /// Delay before retrying after the registry announced `reset_seconds`.
    pub fn delay_for(&self, reset_seconds: u64) -> Duration {
        Duration::from_secs(reset_seconds).saturating_add(self.grace)
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
