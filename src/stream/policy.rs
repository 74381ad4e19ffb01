//! Reconnection policy — bounded attempts with linear backoff.
//!
//! Pure state machine; the stream task owns one [`ReconnectState`] per
//! `connect` call and asks it what to do after each transport error.

use std::time::Duration;

/// Default maximum number of consecutive reconnection attempts.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default base delay; the k-th retry waits `k * BASE_RECONNECT_DELAY`.
pub const BASE_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            base_delay: BASE_RECONNECT_DELAY,
        }
    }
}

/// What to do after a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Wait `delay`, then open attempt number `attempt` (1-based).
    Retry { attempt: u32, delay: Duration },
    /// Budget exhausted; disconnect for good.
    GiveUp,
}

impl ReconnectPolicy {
    /// Delay before the `attempt`-th retry (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Decide given the number of retries already made since the last success.
    pub fn decide(&self, attempts: u32) -> Decision {
        if attempts < self.max_attempts {
            let attempt = attempts + 1;
            Decision::Retry {
                attempt,
                delay: self.delay_for_attempt(attempt),
            }
        } else {
            Decision::GiveUp
        }
    }
}

/// Attempt counter driven by stream lifecycle events.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// A successful open or a well-formed message re-arms the full budget.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn on_transport_error(&mut self) -> Decision {
        let decision = self.policy.decide(self.attempts);
        if let Decision::Retry { attempt, .. } = decision {
            self.attempts = attempt;
        }
        decision
    }
}
