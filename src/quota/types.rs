//! Quota system type definitions

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Default daily call ceiling
pub const DEFAULT_DAILY_LIMIT: u32 = 1500;

/// Default key the quota state is stored under
pub const DEFAULT_STORAGE_KEY: &str = "clinassist_quota";

/// Configuration for the quota governor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Daily call ceiling (default: 1500)
    pub daily_limit: u32,

    /// Key used for the persisted state (default: "clinassist_quota")
    pub storage_key: String,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// Persisted daily usage counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaState {
    /// Accepted calls since the last reset
    pub calls_today: u32,

    /// Caller-reported token usage since the last reset
    #[serde(default)]
    pub tokens_today: u64,

    /// Local calendar date of the last reset
    pub last_reset_date: NaiveDate,

    /// Daily call ceiling
    pub daily_limit: u32,

    /// Configured ceiling `daily_limit` was last synced with.
    /// A runtime override survives restarts until the config changes.
    #[serde(default)]
    pub configured_limit: Option<u32>,

    /// Time of the last recorded call
    #[serde(default)]
    pub last_call_timestamp: Option<DateTime<Utc>>,
}

impl QuotaState {
    /// Fresh state for the given day
    pub fn new(today: NaiveDate, daily_limit: u32) -> Self {
        Self {
            calls_today: 0,
            tokens_today: 0,
            last_reset_date: today,
            daily_limit,
            configured_limit: Some(daily_limit),
            last_call_timestamp: None,
        }
    }

    /// Adopt `limit` if the configured ceiling changed since the last sync.
    /// Returns true when the stored limit was replaced.
    pub fn sync_configured_limit(&mut self, limit: u32) -> bool {
        if self.configured_limit == Some(limit) {
            return false;
        }
        self.daily_limit = limit;
        self.configured_limit = Some(limit);
        true
    }

    /// Zero the counters if `today` is a different calendar day.
    /// Returns true when a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date == today {
            return false;
        }
        self.calls_today = 0;
        self.tokens_today = 0;
        self.last_reset_date = today;
        true
    }

    /// Usage as a whole percentage, capped at 100
    pub fn percentage(&self) -> u32 {
        if self.daily_limit == 0 {
            return 100;
        }
        let pct = (self.calls_today as f64 / self.daily_limit as f64 * 100.0).round();
        (pct as u32).min(100)
    }

    /// Calls left before the ceiling
    pub fn remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.calls_today)
    }
}

/// Coarse usage level for quota indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UsageTier {
    /// Below 75%
    Normal,
    /// 75% and above
    Elevated,
    /// 90% and above
    Critical,
    /// 100%
    Exhausted,
}

impl UsageTier {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            p if p >= 100 => UsageTier::Exhausted,
            p if p >= 90 => UsageTier::Critical,
            p if p >= 75 => UsageTier::Elevated,
            _ => UsageTier::Normal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UsageTier::Normal => "normal",
            UsageTier::Elevated => "elevated",
            UsageTier::Critical => "critical",
            UsageTier::Exhausted => "exhausted",
        }
    }
}

/// Read-only view of today's usage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSummary {
    pub calls_used: u32,
    pub calls_limit: u32,
    pub calls_remaining: u32,
    pub percentage: u32,
    pub tokens_used: u64,
    /// Next local midnight
    pub resets_at: DateTime<Local>,
    /// Over half the budget spent before noon
    pub on_pace_to_exceed: bool,
    pub tier: UsageTier,
}

impl QuotaSummary {
    /// Human-readable reset time, e.g. "12:00 AM on Oct 17"
    pub fn reset_time_label(&self) -> String {
        self.resets_at.format("%-I:%M %p on %b %-d").to_string()
    }
}

/// Result of a pre-flight admission check
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CallAdmission {
    pub allowed: bool,
    /// Why the call was rejected
    pub reason: Option<String>,
    /// Non-blocking usage warning
    pub warning: Option<String>,
}

impl CallAdmission {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            warning: None,
        }
    }

    pub fn allow_with_warning(warning: String) -> Self {
        Self {
            allowed: true,
            reason: None,
            warning: Some(warning),
        }
    }

    pub fn deny(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            warning: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_percentage_rounds_and_caps() {
        let mut state = QuotaState::new(day(1), 1500);
        state.calls_today = 1125;
        assert_eq!(state.percentage(), 75);
        state.calls_today = 1000;
        assert_eq!(state.percentage(), 67);
        state.calls_today = 4000;
        assert_eq!(state.percentage(), 100);
    }

    #[test]
    fn test_roll_over_only_on_new_day() {
        let mut state = QuotaState::new(day(1), 100);
        state.calls_today = 42;
        state.tokens_today = 9000;
        assert!(!state.roll_over(day(1)));
        assert_eq!(state.calls_today, 42);

        assert!(state.roll_over(day(2)));
        assert_eq!(state.calls_today, 0);
        assert_eq!(state.tokens_today, 0);
        assert_eq!(state.last_reset_date, day(2));
        assert_eq!(state.daily_limit, 100);
    }

    #[test]
    fn test_sync_configured_limit() {
        let mut state = QuotaState::new(day(1), 100);
        state.daily_limit = 50;
        assert!(!state.sync_configured_limit(100));
        assert_eq!(state.daily_limit, 50);

        assert!(state.sync_configured_limit(200));
        assert_eq!(state.daily_limit, 200);
        assert_eq!(state.configured_limit, Some(200));
    }

    #[test]
    fn test_legacy_state_without_configured_limit() {
        let json = r#"{"callsToday":3,"lastResetDate":"2026-03-01","dailyLimit":1500}"#;
        let mut state: QuotaState = serde_json::from_str(json).unwrap();
        assert_eq!(state.configured_limit, None);
        assert!(state.sync_configured_limit(1500));
        assert_eq!(state.calls_today, 3);
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = QuotaState::new(day(5), 1500);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"callsToday\":0"));
        assert!(json.contains("\"lastResetDate\":\"2026-03-05\""));
        assert!(json.contains("\"dailyLimit\":1500"));
    }

    #[test]
    fn test_usage_tier_thresholds() {
        assert_eq!(UsageTier::from_percentage(74), UsageTier::Normal);
        assert_eq!(UsageTier::from_percentage(75), UsageTier::Elevated);
        assert_eq!(UsageTier::from_percentage(90), UsageTier::Critical);
        assert_eq!(UsageTier::from_percentage(100), UsageTier::Exhausted);
    }
}
