use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::due::TimeOfDay;
use super::repeat::Repeat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Done,
}

impl Status {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// The fixed category set from the add form: one plain-task kind and the
/// four schedule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Task,
    Class,
    Routine,
    Meeting,
    Work,
}

/// Whether a category behaves as a one-off task or a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Task,
    Schedule,
}

impl Category {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::Class => "Class",
            Self::Routine => "Routine",
            Self::Meeting => "Meeting",
            Self::Work => "Work",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "Task" => Some(Self::Task),
            "Class" => Some(Self::Class),
            "Routine" => Some(Self::Routine),
            "Meeting" => Some(Self::Meeting),
            "Work" => Some(Self::Work),
            _ => None,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Task => Kind::Task,
            _ => Kind::Schedule,
        }
    }
}

/// A persisted task or schedule row.
///
/// `start_date`/`end_date` are set only for schedule kinds; a plain task
/// uses `date`/`time` as its due point. The reminder handle lives in a
/// `notify::ReminderState` on the row, not as a bare nullable string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub location: Option<String>,
    pub status: Status,
    pub repeat: Repeat,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reminder_minutes: Option<u32>,
    pub reminder: crate::notify::ReminderState,
}

impl TaskRecord {
    pub fn kind(&self) -> Kind {
        self.category.kind()
    }

    /// Lead time for the reminder, defaulting like the add form does.
    pub fn lead_minutes(&self) -> u32 {
        self.reminder_minutes.unwrap_or(5)
    }
}

/// Input to `Store::insert_task`, before an id is assigned.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub location: Option<String>,
    pub repeat: Repeat,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reminder_minutes: Option<u32>,
}

impl TaskDraft {
    pub fn new(user_id: Uuid, title: impl Into<String>, date: NaiveDate, time: TimeOfDay) -> Self {
        Self {
            user_id,
            title: title.into(),
            description: None,
            category: Category::Task,
            date,
            time,
            location: None,
            repeat: Repeat::None,
            start_date: None,
            end_date: None,
            reminder_minutes: None,
        }
    }
}

/// Which tab of the list view is being populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTab {
    All,
    Today,
    Upcoming,
    Completed,
}

/// Secondary narrowing by category kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    Task,
    Schedule,
}

impl TypeFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Task => category.kind() == Kind::Task,
            Self::Schedule => category.kind() == Kind::Schedule,
        }
    }
}
