//! Resilience type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retries after the first attempt
pub const MAX_RETRIES: u32 = 3;

/// Upper bound accepted from configuration
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Base delay for exponential backoff (2 seconds)
pub const INITIAL_DELAY_MS: u64 = 2000;

/// Minimum gap between any two dispatched attempts
pub const MIN_REQUEST_INTERVAL_MS: u64 = 350;

/// Global cooldown after rate-limit retries are exhausted
pub const COOLDOWN_SECS: u64 = 60;

/// Jitter bounds applied to each backoff delay
pub const JITTER_MIN: f64 = 0.75;
pub const JITTER_MAX: f64 = 1.25;

/// Configuration for the resilient call wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Retries after the first attempt (default: 3)
    pub max_retries: u32,

    /// Backoff base in milliseconds (default: 2000)
    pub initial_delay_ms: u64,

    /// Process-wide pacing gap in milliseconds (default: 350)
    pub min_request_interval_ms: u64,

    /// Circuit cooldown in seconds (default: 60)
    pub cooldown_secs: u64,

    /// Randomize backoff delays (default: true)
    pub jitter: bool,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay_ms: INITIAL_DELAY_MS,
            min_request_interval_ms: MIN_REQUEST_INTERVAL_MS,
            cooldown_secs: COOLDOWN_SECS,
            jitter: true,
        }
    }
}

impl ResilienceConfig {
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// How a failed attempt is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureClass {
    /// Provider quota hit; retried, then opens the global circuit
    RateLimited,
    /// Provider overloaded; retried, failure stays local to the call
    Overloaded,
    /// Anything else; returned unchanged
    Other,
}

impl FailureClass {
    /// Classify by error text; the wrapper never assumes a transport
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();

        if message.contains("429") || message.contains("resource_exhausted") {
            FailureClass::RateLimited
        } else if message.contains("503")
            || message.contains("unavailable")
            || message.contains("high demand")
        {
            FailureClass::Overloaded
        } else {
            FailureClass::Other
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureClass::Other)
    }
}

/// Snapshot of the rate-limit circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitStatus {
    pub is_open: bool,
    /// Time left until the cooldown ends
    pub remaining: Duration,
}
