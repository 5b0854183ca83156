//! Telemetry for resilient API calls
//!
//! Collects call-wrapper events and running counters for status displays.
//! The event log is a bounded ring; counters cover every event ever seen.
//! Timestamps use the tokio clock so paused-time tests see virtual time.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use crate::resilience::FailureClass;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum CallEvent {
    AttemptStarted {
        attempt: u32,
        timestamp: Instant,
    },
    RetryScheduled {
        attempt: u32,
        class: FailureClass,
        delay_ms: u64,
        timestamp: Instant,
    },
    CircuitOpened {
        cooldown_ms: u64,
        timestamp: Instant,
    },
    CooldownWaited {
        waited_ms: u64,
        timestamp: Instant,
    },
    QuotaWarning {
        message: String,
        timestamp: Instant,
    },
    QuotaRejected {
        reason: String,
        timestamp: Instant,
    },
    CallSucceeded {
        attempts: u32,
        duration_ms: u64,
        timestamp: Instant,
    },
    CallFailed {
        attempts: u32,
        error: String,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStats {
    pub attempts: usize,
    pub rate_limit_retries: usize,
    pub overload_retries: usize,
    pub circuit_openings: usize,
    pub cooldown_waits: usize,
    pub quota_warnings: usize,
    pub quota_rejections: usize,
    pub calls_succeeded: usize,
    pub calls_failed: usize,
}

impl CallStats {
    pub fn retries(&self) -> usize {
        self.rate_limit_retries + self.overload_retries
    }
}

/// Default number of events kept in the log
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<VecDeque<CallEvent>>>,
    stats: Arc<Mutex<CallStats>>,
    capacity: usize,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Collector keeping at most `capacity` recent events
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)))),
            stats: Arc::new(Mutex::new(CallStats::default())),
            capacity,
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: CallEvent) {
        {
            let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
            match &event {
                CallEvent::AttemptStarted { .. } => stats.attempts += 1,
                CallEvent::RetryScheduled { class, .. } => match class {
                    FailureClass::RateLimited => stats.rate_limit_retries += 1,
                    FailureClass::Overloaded => stats.overload_retries += 1,
                    FailureClass::Other => {}
                },
                CallEvent::CircuitOpened { .. } => stats.circuit_openings += 1,
                CallEvent::CooldownWaited { .. } => stats.cooldown_waits += 1,
                CallEvent::QuotaWarning { .. } => stats.quota_warnings += 1,
                CallEvent::QuotaRejected { .. } => stats.quota_rejections += 1,
                CallEvent::CallSucceeded { .. } => stats.calls_succeeded += 1,
                CallEvent::CallFailed { .. } => stats.calls_failed += 1,
            }
        }

        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> CallStats {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<CallEvent> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let start = events.len().saturating_sub(n);
        events.iter().skip(start).cloned().collect()
    }

    /// Maximum number of events kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Share of finished calls that succeeded
    pub fn success_rate(&self) -> f64 {
        let stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        let total = stats.calls_succeeded + stats.calls_failed;
        if total == 0 {
            1.0
        } else {
            stats.calls_succeeded as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
