//! Working preferences and planner settings.
//!
//! Settings arrive from an external profile store as a partial
//! [`WorkingPreferences`] object and are normalized against built-in
//! defaults, so a missing or malformed preference never makes a weekday
//! unusable. The resolved [`UserSettings`] is caller-supplied to every
//! planning call; the engine holds no process-wide configuration.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::slot::EnergyLevel;

/// A half-open range of fractional hours within a day, e.g. 9.0..12.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyWindowRange {
    pub start: f64,
    pub end: f64,
}

impl EnergyWindowRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: f64) -> bool {
        hour >= self.start && hour < self.end
    }
}

/// Time-of-day ranges mapped to energy tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyWindows {
    pub high: Vec<EnergyWindowRange>,
    pub med: Vec<EnergyWindowRange>,
    pub low: Vec<EnergyWindowRange>,
}

impl EnergyWindows {
    /// Resolve the energy tier for a fractional hour of day.
    ///
    /// Ranges are checked HIGH, then MED, then LOW; hours outside every
    /// window fall back to MED.
    pub fn level_at(&self, hour: f64) -> EnergyLevel {
        if self.high.iter().any(|range| range.contains(hour)) {
            return EnergyLevel::High;
        }
        if self.med.iter().any(|range| range.contains(hour)) {
            return EnergyLevel::Med;
        }
        if self.low.iter().any(|range| range.contains(hour)) {
            return EnergyLevel::Low;
        }
        EnergyLevel::Med
    }
}

impl Default for EnergyWindows {
    fn default() -> Self {
        Self {
            high: vec![EnergyWindowRange::new(9.0, 12.0)],
            med: vec![EnergyWindowRange::new(13.0, 16.0)],
            low: vec![EnergyWindowRange::new(16.0, 19.0)],
        }
    }
}

/// Per-weekday working window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkingDayPreference {
    pub day: Weekday,
    pub start_hour: u32,
    pub end_hour: u32,
    pub enabled: bool,
}

impl WorkingDayPreference {
    pub fn new(day: Weekday, start_hour: u32, end_hour: u32, enabled: bool) -> Self {
        Self {
            day,
            start_hour,
            end_hour,
            enabled,
        }
    }
}

/// Default working week: Mon-Thu 8-17, Fri 8-16, weekend configured but
/// disabled.
pub fn default_working_days() -> Vec<WorkingDayPreference> {
    vec![
        WorkingDayPreference::new(Weekday::Mon, 8, 17, true),
        WorkingDayPreference::new(Weekday::Tue, 8, 17, true),
        WorkingDayPreference::new(Weekday::Wed, 8, 17, true),
        WorkingDayPreference::new(Weekday::Thu, 8, 17, true),
        WorkingDayPreference::new(Weekday::Fri, 8, 16, true),
        WorkingDayPreference::new(Weekday::Sat, 9, 13, false),
        WorkingDayPreference::new(Weekday::Sun, 9, 13, false),
    ]
}

/// Partial preferences as supplied by the external profile store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingPreferences {
    pub working_days: Option<Vec<WorkingDayPreference>>,
    pub slot_minutes: Option<u32>,
    pub buffer_pct: Option<f64>,
    pub break_minutes: Option<u32>,
    pub max_continuous_minutes: Option<u32>,
    pub energy_windows: Option<EnergyWindows>,
    pub wip_projects_max: Option<usize>,
}

/// Fully resolved planner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Slot granularity in minutes.
    pub slot_minutes: u32,
    /// Fraction of daily focus minutes reserved as trailing buffer.
    pub buffer_pct: f64,
    pub energy_windows: EnergyWindows,
    /// Maximum distinct projects per planning run; 0 disables the cap.
    pub wip_projects_max: usize,
    pub working_days: Vec<WorkingDayPreference>,
    /// Focus minutes allowed before a mandatory break is inserted.
    pub max_continuous_minutes: u32,
    pub break_minutes: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            buffer_pct: 0.15,
            energy_windows: EnergyWindows::default(),
            wip_projects_max: 3,
            working_days: default_working_days(),
            max_continuous_minutes: 180,
            break_minutes: 15,
        }
    }
}

impl UserSettings {
    /// Normalize partial preferences against the defaults.
    ///
    /// Non-positive numeric overrides fall back to their default value;
    /// per-day overrides are sanitized and merged over the default week.
    pub fn from_preferences(prefs: &WorkingPreferences) -> Self {
        let defaults = UserSettings::default();
        Self {
            slot_minutes: positive_or(prefs.slot_minutes, defaults.slot_minutes),
            buffer_pct: match prefs.buffer_pct {
                Some(pct) if pct.is_finite() && pct >= 0.0 => pct,
                _ => defaults.buffer_pct,
            },
            energy_windows: prefs
                .energy_windows
                .clone()
                .unwrap_or(defaults.energy_windows),
            wip_projects_max: prefs.wip_projects_max.unwrap_or(defaults.wip_projects_max),
            working_days: merge_working_days(prefs.working_days.as_deref()),
            max_continuous_minutes: positive_or(
                prefs.max_continuous_minutes,
                defaults.max_continuous_minutes,
            ),
            break_minutes: positive_or(prefs.break_minutes, defaults.break_minutes),
        }
    }

    /// Find the enabled working window for a date's weekday.
    ///
    /// Returns `None` for disabled days and for windows whose end hour is
    /// not strictly after the start hour; callers treat that as "no
    /// schedulable capacity", not as an error.
    pub fn resolve_working_day(&self, date: NaiveDate) -> Option<&WorkingDayPreference> {
        let weekday = date.weekday();
        let entry = self.working_days.iter().find(|day| day.day == weekday)?;
        if !entry.enabled || entry.end_hour <= entry.start_hour {
            return None;
        }
        Some(entry)
    }

    /// Reject configuration that cannot be defaulted away.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.slot_minutes == 0 {
            return Err(SettingsError::invalid(
                "slot_minutes",
                "slot length must be positive",
            ));
        }
        if !self.buffer_pct.is_finite() || self.buffer_pct < 0.0 {
            return Err(SettingsError::invalid(
                "buffer_pct",
                format!("must be a non-negative fraction, got {}", self.buffer_pct),
            ));
        }
        if self.break_minutes == 0 {
            return Err(SettingsError::invalid(
                "break_minutes",
                "break length must be positive",
            ));
        }
        Ok(())
    }
}

fn positive_or(value: Option<u32>, default: u32) -> u32 {
    match value {
        Some(v) if v > 0 => v,
        _ => default,
    }
}

fn sanitize_day(day: &WorkingDayPreference) -> Option<WorkingDayPreference> {
    let start_hour = day.start_hour.min(24);
    let end_hour = day.end_hour.min(24);
    if end_hour <= start_hour {
        return None;
    }
    Some(WorkingDayPreference {
        day: day.day,
        start_hour,
        end_hour,
        enabled: day.enabled,
    })
}

/// Merge user-supplied day overrides over the default week.
///
/// Invalid entries are dropped; days the user never mentions keep their
/// defaults. The result always covers all seven weekdays, Monday first.
pub fn merge_working_days(days: Option<&[WorkingDayPreference]>) -> Vec<WorkingDayPreference> {
    let mut merged = default_working_days();
    for entry in days.unwrap_or_default() {
        let Some(sanitized) = sanitize_day(entry) else {
            continue;
        };
        if let Some(slot) = merged.iter_mut().find(|d| d.day == sanitized.day) {
            *slot = sanitized;
        }
    }
    merged.sort_by_key(|d| d.day.num_days_from_monday());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_windows_check_high_then_med_then_low() {
        let windows = EnergyWindows::default();
        assert_eq!(windows.level_at(9.0), EnergyLevel::High);
        assert_eq!(windows.level_at(11.5), EnergyLevel::High);
        assert_eq!(windows.level_at(13.0), EnergyLevel::Med);
        assert_eq!(windows.level_at(16.0), EnergyLevel::Low);
        assert_eq!(windows.level_at(7.0), EnergyLevel::Med, "no window matches");
        assert_eq!(windows.level_at(12.0), EnergyLevel::Med, "gap between windows");
    }

    #[test]
    fn overlapping_windows_prefer_high() {
        let windows = EnergyWindows {
            high: vec![EnergyWindowRange::new(9.0, 12.0)],
            med: vec![EnergyWindowRange::new(8.0, 18.0)],
            low: vec![EnergyWindowRange::new(8.0, 18.0)],
        };
        assert_eq!(windows.level_at(10.0), EnergyLevel::High);
        assert_eq!(windows.level_at(14.0), EnergyLevel::Med);
    }

    #[test]
    fn merge_keeps_defaults_for_unspecified_days() {
        let overrides = [WorkingDayPreference::new(Weekday::Sat, 10, 14, true)];
        let merged = merge_working_days(Some(&overrides));

        assert_eq!(merged.len(), 7);
        let saturday = merged.iter().find(|d| d.day == Weekday::Sat).unwrap();
        assert!(saturday.enabled);
        assert_eq!(saturday.start_hour, 10);

        let monday = merged.iter().find(|d| d.day == Weekday::Mon).unwrap();
        assert_eq!((monday.start_hour, monday.end_hour), (8, 17));
        assert!(monday.enabled);
    }

    #[test]
    fn merge_drops_invalid_overrides() {
        let overrides = [
            WorkingDayPreference::new(Weekday::Mon, 17, 8, true),
            WorkingDayPreference::new(Weekday::Tue, 9, 30, true),
        ];
        let merged = merge_working_days(Some(&overrides));

        let monday = merged.iter().find(|d| d.day == Weekday::Mon).unwrap();
        assert_eq!(monday.start_hour, 8, "inverted window is dropped");

        let tuesday = merged.iter().find(|d| d.day == Weekday::Tue).unwrap();
        assert_eq!(tuesday.end_hour, 24, "hours are clamped to 24");
    }

    #[test]
    fn preferences_normalize_against_defaults() {
        let prefs = WorkingPreferences {
            slot_minutes: Some(0),
            buffer_pct: Some(-0.5),
            break_minutes: Some(10),
            ..WorkingPreferences::default()
        };
        let settings = UserSettings::from_preferences(&prefs);

        assert_eq!(settings.slot_minutes, 30, "zero slot falls back to default");
        assert_eq!(settings.buffer_pct, 0.15, "negative buffer falls back");
        assert_eq!(settings.break_minutes, 10);
        assert_eq!(settings.max_continuous_minutes, 180);
    }

    #[test]
    fn resolve_working_day_skips_disabled_weekdays() {
        let settings = UserSettings::default();
        // 2025-03-10 is a Monday, 2025-03-15 a Saturday.
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

        assert!(settings.resolve_working_day(monday).is_some());
        assert!(settings.resolve_working_day(saturday).is_none());
    }

    #[test]
    fn validate_rejects_non_defaultable_values() {
        let mut settings = UserSettings::default();
        assert!(settings.validate().is_ok());

        settings.slot_minutes = 0;
        assert!(settings.validate().is_err());

        settings.slot_minutes = 30;
        settings.buffer_pct = f64::NAN;
        assert!(settings.validate().is_err());
    }
}
