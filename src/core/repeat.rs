use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Weekday labels as the add form shows them, Sun-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeekdayLabel {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl WeekdayLabel {
    pub const ALL: [WeekdayLabel; 7] = [
        Self::Sun,
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
    ];

    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "Sun" => Some(Self::Sun),
            "Mon" => Some(Self::Mon),
            "Tue" => Some(Self::Tue),
            "Wed" => Some(Self::Wed),
            "Thu" => Some(Self::Thu),
            "Fri" => Some(Self::Fri),
            "Sat" => Some(Self::Sat),
            _ => None,
        }
    }
}

impl fmt::Display for WeekdayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_keyword())
    }
}

/// Recurrence for a task or schedule.
///
/// The weekly day-set lives inside the `Weekly` variant so a day-set can
/// never exist alongside any other frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    None,
    Daily,
    Weekly(BTreeSet<WeekdayLabel>),
}

impl Repeat {
    /// The `repeat_frequency` column value.
    pub fn frequency(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly(_) => "weekly",
        }
    }

    /// The `repeat_days` column value: a JSON array of labels, weekly only.
    pub fn days_column(&self) -> Option<String> {
        match self {
            Self::Weekly(days) => {
                let labels: Vec<&str> = days.iter().map(|d| d.as_keyword()).collect();
                serde_json::to_string(&labels).ok()
            }
            _ => None,
        }
    }

    /// Rebuild from the two columns. Unknown labels in the JSON are dropped
    /// rather than failing the whole row read.
    pub fn from_columns(frequency: &str, days: Option<&str>) -> Self {
        match frequency {
            "daily" => Self::Daily,
            "weekly" => {
                let labels: Vec<String> = days
                    .and_then(|json| serde_json::from_str(json).ok())
                    .unwrap_or_default();
                let set: BTreeSet<WeekdayLabel> = labels
                    .iter()
                    .filter_map(|l| WeekdayLabel::from_keyword(l))
                    .collect();
                Self::Weekly(set)
            }
            _ => Self::None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for Repeat {
    fn default() -> Self {
        Self::None
    }
}
