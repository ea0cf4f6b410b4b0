pub mod scheduler;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::task::Kind;

pub use scheduler::ReminderScheduler;

/// Opaque identifier the platform notifier hands back at registration,
/// needed later to cancel the pending reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderHandle(pub String);

impl ReminderHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reminder lifecycle of a task row.
///
/// `Scheduled` is the only state that carries a live handle; once the
/// reminder fires or is cancelled the handle is gone and reads see the
/// terminal state instead of a stale id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderState {
    None,
    Scheduled(ReminderHandle),
    Cancelled,
    Fired,
}

impl ReminderState {
    pub fn handle(&self) -> Option<&ReminderHandle> {
        match self {
            Self::Scheduled(h) => Some(h),
            _ => None,
        }
    }

    /// The `reminder_state` column value.
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Scheduled(_) => "scheduled",
            Self::Cancelled => "cancelled",
            Self::Fired => "fired",
        }
    }

    /// Rebuild from the `reminder_state` and `notification_id` columns.
    /// A "scheduled" row without a stored handle degrades to `None`.
    pub fn from_columns(state: &str, handle: Option<String>) -> Self {
        match state {
            "scheduled" => match handle {
                Some(id) => Self::Scheduled(ReminderHandle(id)),
                None => Self::None,
            },
            "cancelled" => Self::Cancelled,
            "fired" => Self::Fired,
            _ => Self::None,
        }
    }
}

impl Default for ReminderState {
    fn default() -> Self {
        Self::None
    }
}

/// What the platform notifier is asked to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub trigger: NaiveDateTime,
    pub category: Kind,
}

impl NotificationRequest {
    /// Builds the user-facing text for a due reminder, phrased by kind.
    pub fn due(task_title: &str, kind: Kind, lead_minutes: u32, trigger: NaiveDateTime) -> Self {
        let (title, body) = match kind {
            Kind::Task => (
                "Upcoming Task".to_string(),
                format!("Your task \"{task_title}\" is due in {lead_minutes} minutes!"),
            ),
            Kind::Schedule => (
                "Upcoming Schedule".to_string(),
                format!("Your schedule \"{task_title}\" starts in {lead_minutes} minutes!"),
            ),
        };
        Self {
            title,
            body,
            trigger,
            category: kind,
        }
    }

    pub fn missed(task_title: &str, kind: Kind, trigger: NaiveDateTime) -> Self {
        Self {
            title: "Missed Task".to_string(),
            body: format!("You missed your task: \"{task_title}\"."),
            trigger,
            category: kind,
        }
    }
}

/// The platform notifier seam.
///
/// `register` may fail (permission denied, platform error); `cancel` may be
/// rejected for unknown handles — the scheduler treats both as best-effort.
pub trait Notifier {
    fn register(
        &self,
        request: &NotificationRequest,
    ) -> impl std::future::Future<Output = Result<ReminderHandle, String>> + Send;

    fn cancel(
        &self,
        handle: &ReminderHandle,
    ) -> impl std::future::Future<Output = Result<(), String>> + Send;

    fn cancel_all(&self) -> impl std::future::Future<Output = Result<(), String>> + Send;
}

/// Outcome of a scheduling or cancellation attempt. Notifier failures never
/// propagate past the scheduler; callers inspect this instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    Scheduled(ReminderHandle),
    /// Trigger instant was not strictly in the future; no platform call made.
    SkippedPast,
    /// Notifications are disabled for the session; no platform call made.
    Disabled,
    /// Nothing to cancel, or cancellation completed.
    Cancelled,
    /// The platform call or the follow-up persist failed; reason is logged.
    Failed(String),
}

impl ReminderOutcome {
    pub fn handle(&self) -> Option<&ReminderHandle> {
        match self {
            Self::Scheduled(h) => Some(h),
            _ => None,
        }
    }
}
