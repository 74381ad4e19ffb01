//! Retry policies for REST calls.
//!
//! The dashboard never retries REST calls on its own, so `RetryPolicy::None`
//! is the client-wide default. Callers opt in through the client builder.

use rand::Rng;
use std::time::Duration;

/// Statuses worth retrying for any read-only request.
const GATEWAY_STATUSES: [u16; 3] = [502, 503, 504];

#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Failures go straight back to the caller.
    #[default]
    None,
    /// Gateway errors, transport failures, and 429.
    Idempotent,
    Custom(RetryConfig),
}

impl RetryPolicy {
    /// The effective config, or `None` when requests are never retried.
    pub fn config(&self) -> Option<RetryConfig> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Idempotent => Some(RetryConfig::idempotent()),
            RetryPolicy::Custom(config) => Some(config.clone()),
        }
    }
}

/// Exponential backoff with an upper bound and optional ±25% jitter.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first request.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    pub jitter: bool,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            jitter: true,
            retryable_statuses: GATEWAY_STATUSES.to_vec(),
        }
    }
}

impl RetryConfig {
    pub fn idempotent() -> Self {
        let mut retryable_statuses = vec![429];
        retryable_statuses.extend(GATEWAY_STATUSES);
        Self {
            retryable_statuses,
            ..Self::default()
        }
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Wait before retry number `attempt + 1` (`attempt` is 0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let initial_ms = self.initial_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;
        let mut ms = max_ms.min(initial_ms * self.backoff_factor.powi(exponent));

        if self.jitter && ms > 0.0 {
            ms *= rand::thread_rng().gen_range(0.75..=1.25);
        }
        Duration::from_millis(ms.max(0.0) as u64)
    }
}
