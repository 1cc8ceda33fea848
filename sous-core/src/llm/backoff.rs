//! Exponential backoff for rate-limited requests.

use std::time::Duration;

/// Retry schedule for 429 responses.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    /// Total time after which retrying stops.
    pub max_elapsed: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(2),
            multiplier: 1.05,
            max_interval: Duration::from_secs(30),
            max_elapsed: Duration::from_secs(60),
        }
    }
}

/// Backoff state for a single request.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        let current = policy.initial_interval;
        Self { policy, current }
    }

    /// Delay before the next attempt, or `None` once waiting would run past
    /// the elapsed-time budget.
    pub fn next_delay(&mut self, elapsed: Duration) -> Option<Duration> {
        let delay = self.current;
        if elapsed + delay > self.policy.max_elapsed {
            return None;
        }

        let next = self.current.mul_f64(self.policy.multiplier);
        self.current = next.min(self.policy.max_interval);
        Some(delay)
    }

    /// Like `next_delay`, but waits at least as long as a server-provided
    /// hint. A hint longer than `max_interval`, or one that would run past
    /// the elapsed-time budget, ends the retries.
    pub fn next_delay_with_hint(
        &mut self,
        elapsed: Duration,
        hint: Option<Duration>,
    ) -> Option<Duration> {
        let delay = self.next_delay(elapsed)?;
        match hint {
            Some(hinted) if hinted > delay => {
                if hinted > self.policy.max_interval || elapsed + hinted > self.policy.max_elapsed {
                    None
                } else {
                    Some(hinted)
                }
            }
            _ => Some(delay),
        }
    }
}
