//! Slot builder: turns a calendar date, working preferences, and the
//! day's busy intervals into an ordered sequence of time slots.
//!
//! - Focus slots carry schedulable capacity (`available_minutes`).
//! - Meeting slots mark externally-fixed busy time.
//! - Break slots are inserted once the continuous focus streak reaches
//!   the configured maximum.
//! - A single trailing buffer slot represents reserved slack after the
//!   working window; it is informational and never allocated.
//!
//! Slot ids are deterministic and date-scoped so repeated calls with
//! identical inputs produce identical slot lists, which downstream
//! persistence relies on for idempotent upserts.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::settings::UserSettings;

/// Unique identifier for a slot.
pub type SlotId = String;

/// Energy tier of a time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergyLevel {
    High,
    Med,
    Low,
}

impl EnergyLevel {
    /// Position on the shared 1-3 ordinal scale used for energy matching.
    pub fn value(&self) -> u8 {
        match self {
            EnergyLevel::High => 3,
            EnergyLevel::Med => 2,
            EnergyLevel::Low => 1,
        }
    }
}

/// Type of slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    Focus,
    Meeting,
    Break,
    Buffer,
}

/// An externally-fixed busy interval (calendar meeting) for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusyInterval {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start,
            end,
        }
    }

    /// Open-interval overlap test against a candidate slot.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && self.start < end
    }
}

/// A time slot on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub energy: EnergyLevel,
    pub slot_type: SlotType,
    /// Schedulable minutes left; the slot's duration for focus slots,
    /// zero for every other type. Drained by the allocator.
    pub available_minutes: u32,
    /// Id of the busy interval that claimed this slot, for meeting slots.
    pub block_id: Option<String>,
}

impl Slot {
    /// Total span of the slot in minutes.
    pub fn duration_minutes(&self) -> u32 {
        (self.end - self.start).num_minutes().max(0) as u32
    }
}

/// Build the ordered slot list for one calendar date.
///
/// A disabled weekday (or one whose end hour is not after its start
/// hour) yields an empty list: nothing to allocate that day, not an
/// error. Settings that cannot be defaulted fail fast instead.
pub fn build_slots(
    date: NaiveDate,
    settings: &UserSettings,
    busy: &[BusyInterval],
) -> Result<Vec<Slot>> {
    settings.validate()?;

    let Some(working_day) = settings.resolve_working_day(date) else {
        return Ok(Vec::new());
    };

    let midnight = date.and_time(NaiveTime::MIN).and_utc();
    let window_start = midnight + Duration::minutes(i64::from(working_day.start_hour) * 60);
    let window_end = midnight + Duration::minutes(i64::from(working_day.end_hour) * 60);
    let slot_len = Duration::minutes(i64::from(settings.slot_minutes));
    let break_len = Duration::minutes(i64::from(settings.break_minutes));

    let mut slots = Vec::new();
    let mut cursor = window_start;
    let mut focus_minutes: u32 = 0;
    let mut streak_minutes: u32 = 0;
    let mut slot_index = 0usize;
    let mut break_index = 0usize;

    while cursor < window_end {
        if streak_minutes >= settings.max_continuous_minutes {
            // Mandatory break instead of a regular step; clamped so it
            // never extends past the working window.
            let break_end = (cursor + break_len).min(window_end);
            slots.push(Slot {
                id: format!("{date}-break-{break_index}"),
                start: cursor,
                end: break_end,
                energy: EnergyLevel::Low,
                slot_type: SlotType::Break,
                available_minutes: 0,
                block_id: None,
            });
            break_index += 1;
            cursor = break_end;
            streak_minutes = 0;
            continue;
        }

        let step_end = (cursor + slot_len).min(window_end);
        let step_minutes = (step_end - cursor).num_minutes() as u32;
        let hour = (cursor - midnight).num_minutes() as f64 / 60.0;
        let energy = settings.energy_windows.level_at(hour);
        let overlapping = busy.iter().find(|block| block.overlaps(cursor, step_end));

        let slot = match overlapping {
            Some(block) => {
                streak_minutes = 0;
                Slot {
                    id: format!("{date}-slot-{slot_index}"),
                    start: cursor,
                    end: step_end,
                    energy,
                    slot_type: SlotType::Meeting,
                    available_minutes: 0,
                    block_id: Some(block.id.clone()),
                }
            }
            None => {
                focus_minutes += step_minutes;
                streak_minutes += step_minutes;
                Slot {
                    id: format!("{date}-slot-{slot_index}"),
                    start: cursor,
                    end: step_end,
                    energy,
                    slot_type: SlotType::Focus,
                    available_minutes: step_minutes,
                    block_id: None,
                }
            }
        };
        slots.push(slot);
        slot_index += 1;
        cursor = step_end;
    }

    let buffer_minutes = (f64::from(focus_minutes) * settings.buffer_pct).round() as u32;
    if focus_minutes > 0 && buffer_minutes > 0 {
        slots.push(Slot {
            id: format!("{date}-buffer"),
            start: window_end,
            end: window_end + Duration::minutes(i64::from(buffer_minutes)),
            energy: EnergyLevel::Low,
            slot_type: SlotType::Buffer,
            available_minutes: 0,
            block_id: None,
        });
    }

    Ok(slots)
}
