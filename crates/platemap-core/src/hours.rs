//! Opening-hours evaluation.
//!
//! The platform emits one optional string per weekday, either the literal
//! `"Closed"` or a single `"HH:MM-HH:MM"` interval. [`is_open_at`] decides
//! open/closed for an explicit instant — callers inject the clock, the
//! evaluator never reads ambient time.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Marker string the platform uses for a day with no service.
pub const CLOSED_MARKER: &str = "Closed";

/// Weekly opening hours as scraped from the platform.
///
/// `displayed_hours` is a free-text summary for UI display only; it is never
/// consulted by the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    pub sun: Option<String>,
    pub mon: Option<String>,
    pub tue: Option<String>,
    pub wed: Option<String>,
    pub thu: Option<String>,
    pub fri: Option<String>,
    pub sat: Option<String>,
    pub displayed_hours: Option<String>,
}

impl OpeningHours {
    /// Returns the raw hours string for a Sunday=0..Saturday=6 weekday index.
    #[must_use]
    pub fn for_weekday(&self, weekday: u32) -> Option<&str> {
        match weekday {
            0 => self.sun.as_deref(),
            1 => self.mon.as_deref(),
            2 => self.tue.as_deref(),
            3 => self.wed.as_deref(),
            4 => self.thu.as_deref(),
            5 => self.fri.as_deref(),
            6 => self.sat.as_deref(),
            _ => None,
        }
    }
}

/// Decides whether a restaurant is open at `instant`.
///
/// Rules:
/// - Missing day entry or the literal `"Closed"` marker → closed.
/// - The day string must be exactly one `"HH:MM-HH:MM"` interval; anything
///   else (including the multi-interval strings the platform sometimes
///   emits, e.g. `"11:00-15:00 18:00-22:00"`) fails the parse and evaluates
///   closed rather than erroring.
/// - Both boundaries are inclusive: at the open minute and at the close
///   minute the restaurant counts as open.
/// - Overnight intervals where close < open never match — such days always
///   evaluate closed.
///
/// The weekday is derived from `instant` in UTC with Sunday=0..Saturday=6.
#[must_use]
pub fn is_open_at(hours: &OpeningHours, instant: DateTime<Utc>) -> bool {
    let weekday = instant.weekday().num_days_from_sunday();
    let Some(raw) = hours.for_weekday(weekday) else {
        return false;
    };

    let raw = raw.trim();
    if raw == CLOSED_MARKER {
        return false;
    }

    let Some((open_minutes, close_minutes)) = parse_interval(raw) else {
        return false;
    };

    let current_minutes = instant.hour() * 60 + instant.minute();
    open_minutes <= current_minutes && current_minutes <= close_minutes
}

/// Parses a single `"HH:MM-HH:MM"` interval into minutes since midnight.
///
/// Returns `None` for any other shape.
fn parse_interval(raw: &str) -> Option<(u32, u32)> {
    let (open, close) = raw.split_once('-')?;
    Some((parse_hhmm(open)?, parse_hhmm(close)?))
}

/// Parses an `"HH:MM"` token into minutes since midnight.
///
/// `24:00` is accepted as an end-of-day close time.
fn parse_hhmm(token: &str) -> Option<u32> {
    let (hours, minutes) = token.trim().split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 24 || minutes > 59 || (hours == 24 && minutes != 0) {
        return None;
    }
    Some(hours * 60 + minutes)
}

#[cfg(test)]
#[path = "hours_test.rs"]
mod hours_test;
