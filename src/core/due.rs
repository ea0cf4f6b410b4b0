use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 12-hour wall-clock time as the app stores and displays it ("9:30 AM").
///
/// Round-trips through the `time` column as text; parsing applies the
/// standard meridiem decode (hour token "12" is hour 0 before the PM +12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    /// Parse "H:MM AM/PM" (leading zero on the hour accepted).
    pub fn parse(s: &str) -> Option<Self> {
        NaiveTime::parse_from_str(s.trim(), "%I:%M %p").ok().map(Self)
    }

    pub fn as_time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%-I:%M %p"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(s: String) -> Result<Self, String> {
        Self::parse(&s).ok_or_else(|| format!("invalid 12-hour time: {s:?}"))
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> String {
        t.to_string()
    }
}

/// The absolute due point of a task in local time.
pub fn due_instant(date: NaiveDate, time: TimeOfDay) -> NaiveDateTime {
    date.and_time(time.as_time())
}

/// When the lead-time reminder should fire: due minus `lead_minutes`.
pub fn trigger_instant(date: NaiveDate, time: TimeOfDay, lead_minutes: i64) -> NaiveDateTime {
    due_instant(date, time) - Duration::minutes(lead_minutes)
}

/// When the "missed" follow-up should fire: due plus one minute.
pub fn missed_instant(date: NaiveDate, time: TimeOfDay) -> NaiveDateTime {
    due_instant(date, time) + Duration::minutes(1)
}
