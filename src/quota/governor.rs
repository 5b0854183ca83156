//! Daily quota governor
//! Admission control and usage accounting for a metered remote API

use chrono::{DateTime, Local, NaiveTime, TimeZone, Timelike, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};
use crate::errors::{ClinicalError, Result};
use crate::quota::store::{MemoryQuotaStore, QuotaStore};
use crate::quota::types::{CallAdmission, QuotaConfig, QuotaState, QuotaSummary, UsageTier};

/// Percentage at which calls are refused
const HARD_STOP_PERCENT: u32 = 100;

/// Percentage at which the exact remaining count is reported
const CRITICAL_PERCENT: u32 = 90;

/// Percentage at which a generic usage warning is shown
const ELEVATED_PERCENT: u32 = 75;

/// Pace heuristic: more than this share used...
const PACE_PERCENT: u32 = 50;

/// ...before this local hour
const PACE_CUTOFF_HOUR: u32 = 12;

/// Persisted daily call budget with tiered warnings.
///
/// Counters reset lazily: every read and write first compares the stored
/// reset date with today's local date. A changed `daily_limit` in the config
/// replaces the stored ceiling on load; `set_daily_limit` overrides it until
/// the config changes again. Storage failures are logged and never
/// reach the caller; the governor keeps working from its in-memory state.
pub struct QuotaGovernor {
    config: QuotaConfig,
    store: Box<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<QuotaState>,
}

impl QuotaGovernor {
    /// Create governor on the system clock
    pub fn new(config: QuotaConfig, store: Box<dyn QuotaStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Create governor with an explicit clock
    pub fn with_clock(config: QuotaConfig, store: Box<dyn QuotaStore>, clock: Arc<dyn Clock>) -> Self {
        let today = clock.now().date_naive();

        let state = match store.load() {
            Ok(Some(mut state)) => {
                let stored = state.daily_limit;
                if state.sync_configured_limit(config.daily_limit) {
                    tracing::info!(
                        stored,
                        configured = config.daily_limit,
                        "Configured daily limit changed, applying it"
                    );
                    if let Err(e) = store.save(&state) {
                        tracing::warn!(error = %e, "Failed to persist quota state");
                    }
                }
                state
            }
            Ok(None) => {
                let state = QuotaState::new(today, config.daily_limit);
                if let Err(e) = store.save(&state) {
                    tracing::warn!(error = %e, "Failed to persist initial quota state");
                }
                state
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load quota state, using defaults");
                QuotaState::new(today, config.daily_limit)
            }
        };

        Self {
            config,
            store,
            clock,
            state: Mutex::new(state),
        }
    }

    /// Governor backed by an in-memory store
    pub fn in_memory(config: QuotaConfig) -> Self {
        Self::new(config, Box::new(MemoryQuotaStore::new()))
    }

    /// Current usage summary
    pub fn get_summary(&self) -> QuotaSummary {
        let now = self.clock.now();
        let state = self.current_state(now);
        summarize(&state, now)
    }

    /// Tiered pre-flight check; only a full budget refuses the call
    pub fn check_before_call(&self) -> CallAdmission {
        let summary = self.get_summary();

        if summary.percentage >= HARD_STOP_PERCENT {
            return CallAdmission::deny(format!(
                "Daily API quota reached ({}/{} calls). Quota resets at {}.",
                summary.calls_used,
                summary.calls_limit,
                summary.reset_time_label()
            ));
        }

        if summary.percentage >= CRITICAL_PERCENT {
            return CallAdmission::allow_with_warning(format!(
                "Only {} API calls remaining today ({}% of daily quota used).",
                summary.calls_remaining, summary.percentage
            ));
        }

        if summary.percentage >= ELEVATED_PERCENT {
            return CallAdmission::allow_with_warning(format!(
                "You've used {}% of today's API quota.",
                summary.percentage
            ));
        }

        if summary.on_pace_to_exceed {
            return CallAdmission::allow_with_warning(format!(
                "High usage early in the day ({}% used before noon). \
                 At this pace the daily API quota may run out before it resets.",
                summary.percentage
            ));
        }

        CallAdmission::allow()
    }

    /// Count one attempted call and optional token usage
    pub fn record_call(&self, tokens_used: Option<u64>) -> QuotaSummary {
        let now = self.clock.now();
        let mut state = self.current_state(now);

        state.calls_today = state.calls_today.saturating_add(1);
        if let Some(tokens) = tokens_used {
            state.tokens_today = state.tokens_today.saturating_add(tokens);
        }
        state.last_call_timestamp = Some(now.with_timezone(&Utc));
        self.persist(&state);

        tracing::debug!(
            calls = state.calls_today,
            limit = state.daily_limit,
            "Recorded API call"
        );

        summarize(&state, now)
    }

    /// Clear persisted usage and start over from today
    pub fn reset(&self) {
        if let Err(e) = self.try_reset() {
            tracing::warn!(error = %e, "Failed to clear persisted quota state");
        }
    }

    /// Like `reset`, but reports a store failure. The in-memory counters are
    /// cleared either way.
    pub fn try_reset(&self) -> Result<()> {
        let cleared = self.store.clear();

        let today = self.clock.now().date_naive();
        let mut state = self.lock_state();
        *state = QuotaState::new(today, self.config.daily_limit);
        tracing::info!("Quota state reset");

        cleared?;
        Ok(())
    }

    /// Change the daily ceiling without touching counters
    pub fn set_daily_limit(&self, limit: u32) -> Result<()> {
        if limit == 0 {
            return Err(ClinicalError::InvalidInput(
                "daily limit must be greater than 0".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut state = self.current_state(now);
        state.daily_limit = limit;
        self.persist(&state);
        tracing::info!(limit, "Daily quota limit updated");
        Ok(())
    }

    /// Current daily ceiling
    pub fn daily_limit(&self) -> u32 {
        self.lock_state().daily_limit
    }

    /// Snapshot of the raw state, after rollover
    pub fn state(&self) -> QuotaState {
        self.current_state(self.clock.now()).clone()
    }

    /// Get configuration
    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Lock the state and apply any pending day rollover
    fn current_state(&self, now: DateTime<Local>) -> MutexGuard<'_, QuotaState> {
        let mut state = self.lock_state();
        if state.roll_over(now.date_naive()) {
            tracing::info!(date = %state.last_reset_date, "New day, quota counters reset");
            self.persist(&state);
        }
        state
    }

    fn lock_state(&self) -> MutexGuard<'_, QuotaState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, state: &QuotaState) {
        if let Err(e) = self.store.save(state) {
            tracing::warn!(error = %e, "Failed to persist quota state");
        }
    }
}

impl std::fmt::Debug for QuotaGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGovernor")
            .field("config", &self.config)
            .field("state", &*self.lock_state())
            .finish()
    }
}

fn summarize(state: &QuotaState, now: DateTime<Local>) -> QuotaSummary {
    let percentage = state.percentage();

    QuotaSummary {
        calls_used: state.calls_today,
        calls_limit: state.daily_limit,
        calls_remaining: state.remaining(),
        percentage,
        tokens_used: state.tokens_today,
        resets_at: next_midnight(now),
        on_pace_to_exceed: percentage > PACE_PERCENT && now.hour() < PACE_CUTOFF_HOUR,
        tier: UsageTier::from_percentage(percentage),
    }
}

fn next_midnight(now: DateTime<Local>) -> DateTime<Local> {
    now.date_naive()
        .succ_opt()
        .and_then(|day| Local.from_local_datetime(&day.and_time(NaiveTime::MIN)).earliest())
        .unwrap_or_else(|| now + chrono::Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn governor_at(limit: u32, now: DateTime<Local>) -> (QuotaGovernor, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        let config = QuotaConfig {
            daily_limit: limit,
            ..Default::default()
        };
        let governor = QuotaGovernor::with_clock(config, Box::new(MemoryQuotaStore::new()), clock.clone());
        (governor, clock)
    }

    fn record_n(governor: &QuotaGovernor, n: u32) {
        for _ in 0..n {
            governor.record_call(None);
        }
    }

    #[test]
    fn test_fresh_governor_summary() {
        let (governor, _) = governor_at(1500, at(10, 15));
        let summary = governor.get_summary();
        assert_eq!(summary.calls_used, 0);
        assert_eq!(summary.calls_limit, 1500);
        assert_eq!(summary.calls_remaining, 1500);
        assert_eq!(summary.percentage, 0);
        assert!(!summary.on_pace_to_exceed);
        assert_eq!(summary.resets_at, at(11, 0));
    }

    #[test]
    fn test_record_call_counts_tokens() {
        let (governor, _) = governor_at(100, at(10, 15));
        governor.record_call(Some(250));
        let summary = governor.record_call(None);
        assert_eq!(summary.calls_used, 2);
        assert_eq!(summary.tokens_used, 250);
        assert!(governor.state().last_call_timestamp.is_some());
    }

    #[test]
    fn test_check_no_warning_below_thresholds() {
        let (governor, _) = governor_at(100, at(10, 15));
        record_n(&governor, 60);
        assert_eq!(governor.check_before_call(), CallAdmission::allow());
    }

    #[test]
    fn test_check_elevated_warning() {
        let (governor, _) = governor_at(100, at(10, 15));
        record_n(&governor, 80);
        let admission = governor.check_before_call();
        assert!(admission.allowed);
        assert!(admission.warning.unwrap().contains("80%"));
    }

    #[test]
    fn test_check_critical_warning_names_remaining() {
        let (governor, _) = governor_at(100, at(10, 15));
        record_n(&governor, 93);
        let admission = governor.check_before_call();
        assert!(admission.allowed);
        assert!(admission.warning.unwrap().contains("Only 7 API calls remaining"));
    }

    #[test]
    fn test_check_hard_stop() {
        let (governor, _) = governor_at(10, at(10, 15));
        record_n(&governor, 10);
        let admission = governor.check_before_call();
        assert!(!admission.allowed);
        let reason = admission.reason.unwrap();
        assert!(reason.contains("10/10"));
        assert!(reason.contains("12:00 AM on Mar 11"));
    }

    #[test]
    fn test_pace_warning_before_noon() {
        let (governor, clock) = governor_at(100, at(10, 9));
        record_n(&governor, 55);
        let admission = governor.check_before_call();
        assert!(admission.allowed);
        assert!(admission.warning.unwrap().contains("early in the day"));

        clock.set(at(10, 13));
        assert!(governor.check_before_call().warning.is_none());
    }

    #[test]
    fn test_day_rollover_resets_counts() {
        let (governor, clock) = governor_at(100, at(10, 20));
        record_n(&governor, 100);
        assert!(!governor.check_before_call().allowed);

        clock.set(at(11, 0));
        let summary = governor.get_summary();
        assert_eq!(summary.calls_used, 0);
        assert!(governor.check_before_call().allowed);
    }

    #[test]
    fn test_set_daily_limit_keeps_counts() {
        let (governor, _) = governor_at(100, at(10, 15));
        record_n(&governor, 10);
        governor.set_daily_limit(20).unwrap();
        let summary = governor.get_summary();
        assert_eq!(summary.calls_used, 10);
        assert_eq!(summary.calls_limit, 20);
        assert_eq!(summary.percentage, 50);
        assert!(governor.set_daily_limit(0).is_err());
    }

    #[test]
    fn test_reset_restores_config_limit() {
        let (governor, _) = governor_at(100, at(10, 15));
        record_n(&governor, 10);
        governor.set_daily_limit(500).unwrap();
        governor.reset();
        assert_eq!(governor.get_summary().calls_used, 0);
        assert_eq!(governor.daily_limit(), 100);
    }

    #[test]
    fn test_storage_failure_is_not_fatal() {
        let store = MemoryQuotaStore::new();
        store.set_failing(true);
        let clock = Arc::new(FixedClock::new(at(10, 15)));
        let governor = QuotaGovernor::with_clock(QuotaConfig::default(), Box::new(store), clock);

        governor.record_call(None);
        governor.reset();
        governor.record_call(None);
        assert_eq!(governor.get_summary().calls_used, 1);
        assert!(governor.check_before_call().allowed);
    }
}
