use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::InspectionRecord;

pub const DEFAULT_WINDOW_START: &str = "09:00";
pub const DEFAULT_WINDOW_END: &str = "16:00";
pub const RECOMMENDATION_LIMIT: usize = 5;

const SLOT_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed time '{value}': expected HH:MM")]
pub struct MalformedTimeError {
    pub value: String,
}

/// Parse an `HH:MM` 24-hour clock value.
pub fn parse_clock(value: &str) -> Result<NaiveTime, MalformedTimeError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| MalformedTimeError {
        value: value.to_string(),
    })
}

const LAST_HOUR: u32 = 23;

/// Hour range scanned for competing inspections. Only the hour component of
/// each bound is significant; the last bucket is `end_hour:00`. Both bounds
/// stay within `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    start_hour: u32,
    end_hour: u32,
}

impl TimeWindow {
    /// Bounds past 23 are clamped to 23.
    pub const fn hours(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour: clamp_hour(start_hour),
            end_hour: clamp_hour(end_hour),
        }
    }

    pub const fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub const fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, MalformedTimeError> {
        let start = parse_clock(start)?;
        let end = parse_clock(end)?;
        Ok(Self::hours(start.hour(), end.hour()))
    }

    /// Number of buckets in the window; zero when the bounds are inverted.
    pub fn slot_count(&self) -> usize {
        if self.end_hour < self.start_hour {
            0
        } else {
            (2 * (self.end_hour - self.start_hour) + 1) as usize
        }
    }

    fn slot_index(&self, hour: u32, minute: u32) -> Option<usize> {
        if hour < self.start_hour {
            return None;
        }
        let index = ((hour - self.start_hour) * 2 + minute / SLOT_MINUTES) as usize;
        (index < self.slot_count()).then_some(index)
    }
}

const fn clamp_hour(hour: u32) -> u32 {
    if hour > LAST_HOUR {
        LAST_HOUR
    } else {
        hour
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::hours(9, 16)
    }
}

/// Congestion label derived from a slot's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl CompetitionLevel {
    pub const fn from_count(count: usize) -> Self {
        match count {
            0..=2 => Self::Low,
            3..=5 => Self::Medium,
            6..=10 => Self::High,
            _ => Self::VeryHigh,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very-high",
        }
    }
}

/// A 30-minute bucket keyed by its `HH:MM` start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: String,
    pub count: usize,
    pub competition: CompetitionLevel,
    pub properties: Vec<InspectionRecord>,
}

impl TimeSlot {
    fn empty(hour: u32, minute: u32) -> Self {
        Self {
            time: format!("{hour:02}:{minute:02}"),
            count: 0,
            competition: CompetitionLevel::Low,
            properties: Vec::new(),
        }
    }
}

/// Bucket `records` into the window's half-hour slots and classify each slot.
///
/// Start minutes are floored: `:00`-`:29` land in the `:00` slot and `:30`-`:59`
/// in the `:30` slot. Records outside the window are ignored and records with
/// an unreadable start time are skipped with a warning.
pub fn aggregate(records: &[InspectionRecord], window: &TimeWindow) -> Vec<TimeSlot> {
    let mut slots: Vec<TimeSlot> = (0..window.slot_count() as u32)
        .map(|offset| {
            TimeSlot::empty(
                window.start_hour + offset / 2,
                (offset % 2) * SLOT_MINUTES,
            )
        })
        .collect();

    for record in records {
        let start = match parse_clock(&record.start_time) {
            Ok(start) => start,
            Err(err) => {
                warn!(address = %record.address, error = %err, "skipping inspection");
                continue;
            }
        };

        if let Some(index) = window.slot_index(start.hour(), start.minute()) {
            let slot = &mut slots[index];
            slot.count += 1;
            slot.properties.push(record.clone());
        }
    }

    for slot in &mut slots {
        slot.competition = CompetitionLevel::from_count(slot.count);
    }

    slots
}

/// The least contested slots, ties kept in chronological order.
pub fn recommendations(slots: &[TimeSlot]) -> Vec<TimeSlot> {
    let mut ranked = slots.to_vec();
    ranked.sort_by_key(|slot| slot.count);
    ranked.truncate(RECOMMENDATION_LIMIT);
    ranked
}
