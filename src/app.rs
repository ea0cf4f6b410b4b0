//! The flows a UI drives: add a task and arm its reminders, mark one done,
//! ask the assistant for a slot. Each step suspends the caller until it
//! resolves; the caller re-queries the store afterwards to refresh its view.

use chrono::NaiveDateTime;

use crate::assist::{MAX_CONTEXT_TASKS, Recommendation, RecommendationClient};
use crate::core::task::{Status, TaskDraft, TaskRecord};
use crate::error::Result;
use crate::notify::{Notifier, ReminderOutcome, ReminderScheduler};
use crate::session::SessionState;
use crate::store::Store;

/// Persist a new task, then arm its lead-time and missed reminders.
///
/// The task is the source of truth: reminder failures are reported in the
/// outcomes but never fail the creation.
pub async fn add_task<N: Notifier>(
    store: &Store,
    scheduler: &ReminderScheduler<N>,
    session: &SessionState,
    draft: &TaskDraft,
    now: NaiveDateTime,
) -> Result<(TaskRecord, ReminderOutcome, ReminderOutcome)> {
    let record = store.insert_task(draft)?;
    let (due, missed) = scheduler
        .schedule_for_task(store, &record, session.notifications_enabled(), now)
        .await;
    // Re-read so the returned record carries the persisted handle.
    let record = store.get_task(record.id)?.unwrap_or(record);
    Ok((record, due, missed))
}

/// Mark a task done and cancel its pending reminder.
pub async fn complete_task<N: Notifier>(
    store: &Store,
    scheduler: &ReminderScheduler<N>,
    task: &TaskRecord,
) -> Result<ReminderOutcome> {
    store.update_status(task.id, Status::Done)?;
    Ok(scheduler.cancel(store, task).await)
}

/// Ask the hosted model for a schedule slot, feeding it the user's nearest
/// upcoming tasks as context.
pub async fn recommend_slot(
    store: &Store,
    client: &RecommendationClient,
    session: &SessionState,
    request_text: &str,
    now: NaiveDateTime,
) -> Result<Recommendation> {
    let context = store.upcoming_context(session.user().id, now.date(), MAX_CONTEXT_TASKS)?;
    client.recommend(&context, request_text, now).await
}
