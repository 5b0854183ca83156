//! Process-wide rate-limit circuit and request pacing gate
//!
//! Both protect one shared provider quota, so every caller in the process
//! observes and extends the same cooldown and pacing window.

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::time::Instant;

use crate::resilience::types::CircuitStatus;

#[derive(Debug, Default)]
struct CircuitState {
    is_open: bool,
    cooldown_until: Option<Instant>,
}

/// Circuit breaker opened when rate-limit retries run out
#[derive(Debug, Default)]
pub struct RateLimitCircuit {
    state: Mutex<CircuitState>,
}

impl RateLimitCircuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open for `cooldown` from now; returns when the cooldown ends
    pub fn open(&self, cooldown: Duration) -> Instant {
        let until = Instant::now() + cooldown;
        let mut state = self.lock();
        state.is_open = true;
        // Concurrent openings keep the later deadline
        state.cooldown_until = Some(match state.cooldown_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
        until
    }

    /// Deadline to wait for, if open and not yet expired
    pub fn pending_cooldown(&self) -> Option<Instant> {
        let state = self.lock();
        match (state.is_open, state.cooldown_until) {
            (true, Some(until)) if Instant::now() < until => Some(until),
            _ => None,
        }
    }

    /// Close the circuit once its cooldown has elapsed.
    /// A circuit reopened with a later deadline stays open.
    pub fn close(&self) {
        let mut state = self.lock();
        let expired = state
            .cooldown_until
            .map(|until| Instant::now() >= until)
            .unwrap_or(true);
        if expired {
            state.is_open = false;
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open
    }

    pub fn status(&self) -> CircuitStatus {
        let state = self.lock();
        let remaining = state
            .cooldown_until
            .filter(|_| state.is_open)
            .map(|until| until.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO);

        CircuitStatus {
            is_open: state.is_open,
            remaining,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CircuitState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Global lower bound on attempt dispatch times
#[derive(Debug, Default)]
pub struct PacingGate {
    last_dispatch: Mutex<Option<Instant>>,
}

impl PacingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next dispatch slot at least `min_gap` after the previous
    /// one and return how long the caller must wait for it.
    pub fn reserve(&self, min_gap: Duration) -> Duration {
        let mut last = self.last_dispatch.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let slot = match *last {
            Some(previous) => (previous + min_gap).max(now),
            None => now,
        };
        *last = Some(slot);
        slot - now
    }

    /// Time of the most recent reserved slot
    pub fn last_dispatch(&self) -> Option<Instant> {
        *self.last_dispatch.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Circuit and pacing state shared by all resilient callers
#[derive(Debug, Default)]
pub struct SharedCallState {
    pub circuit: RateLimitCircuit,
    pub pacing: PacingGate,
}

static GLOBAL_CALL_STATE: OnceLock<Arc<SharedCallState>> = OnceLock::new();

impl SharedCallState {
    /// Isolated state, not shared with the process-wide instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance
    pub fn global() -> Arc<SharedCallState> {
        GLOBAL_CALL_STATE
            .get_or_init(|| Arc::new(SharedCallState::new()))
            .clone()
    }
}
