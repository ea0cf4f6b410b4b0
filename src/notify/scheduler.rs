use chrono::NaiveDateTime;

use crate::core::due::{missed_instant, trigger_instant};
use crate::core::task::TaskRecord;
use crate::store::Store;

use super::{NotificationRequest, Notifier, ReminderOutcome, ReminderState};

/// Translates a task's wall-clock due point into platform reminders and
/// invalidates them when superseded.
///
/// Notifier failures stop here: every path returns a `ReminderOutcome`
/// instead of an error, and the surrounding task operation goes on — a task
/// can exist with no reminder.
pub struct ReminderScheduler<N: Notifier> {
    notifier: N,
}

impl<N: Notifier> ReminderScheduler<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Register the lead-time reminder for `task` and persist the returned
    /// handle on its row.
    ///
    /// Registration happens before the persist; if the persist then fails,
    /// the fresh registration is cancelled best-effort so the platform is
    /// not left holding a reminder no row knows about.
    pub async fn schedule_due(
        &self,
        store: &Store,
        task: &TaskRecord,
        notifications_enabled: bool,
        now: NaiveDateTime,
    ) -> ReminderOutcome {
        if !notifications_enabled {
            return ReminderOutcome::Disabled;
        }
        let lead = task.lead_minutes();
        let trigger = trigger_instant(task.date, task.time, lead as i64);
        if trigger <= now {
            // Already due (or past); silently skip, matching the add flow.
            return ReminderOutcome::SkippedPast;
        }

        let request = NotificationRequest::due(&task.title, task.kind(), lead, trigger);
        let handle = match self.notifier.register(&request).await {
            Ok(h) => h,
            Err(reason) => {
                log::warn!("reminder registration failed for task {}: {reason}", task.id);
                return ReminderOutcome::Failed(reason);
            }
        };

        if let Err(e) = store.set_reminder(task.id, &handle) {
            log::error!("persisting reminder handle for task {} failed: {e}", task.id);
            if let Err(cancel_err) = self.notifier.cancel(&handle).await {
                log::warn!("orphan reminder cancel failed: {cancel_err}");
            }
            return ReminderOutcome::Failed(e.to_string());
        }

        ReminderOutcome::Scheduled(handle)
    }

    /// Register the due-plus-one-minute "missed" follow-up. Its handle is
    /// not kept on the row; the single stored handle belongs to the lead-time
    /// reminder.
    pub async fn schedule_missed(
        &self,
        task: &TaskRecord,
        notifications_enabled: bool,
        now: NaiveDateTime,
    ) -> ReminderOutcome {
        if !notifications_enabled {
            return ReminderOutcome::Disabled;
        }
        let trigger = missed_instant(task.date, task.time);
        if trigger <= now {
            return ReminderOutcome::SkippedPast;
        }

        let request = NotificationRequest::missed(&task.title, task.kind(), trigger);
        match self.notifier.register(&request).await {
            Ok(handle) => ReminderOutcome::Scheduled(handle),
            Err(reason) => {
                log::warn!(
                    "missed-reminder registration failed for task {}: {reason}",
                    task.id
                );
                ReminderOutcome::Failed(reason)
            }
        }
    }

    /// Register both reminders for a freshly created task.
    pub async fn schedule_for_task(
        &self,
        store: &Store,
        task: &TaskRecord,
        notifications_enabled: bool,
        now: NaiveDateTime,
    ) -> (ReminderOutcome, ReminderOutcome) {
        let due = self.schedule_due(store, task, notifications_enabled, now).await;
        let missed = self.schedule_missed(task, notifications_enabled, now).await;
        (due, missed)
    }

    /// Cancel the pending reminder for `task`, if any, and clear the stored
    /// handle. A missing handle is a no-op; a platform rejection of an
    /// unknown or already-fired handle is swallowed and logged.
    pub async fn cancel(&self, store: &Store, task: &TaskRecord) -> ReminderOutcome {
        let Some(handle) = task.reminder.handle() else {
            return ReminderOutcome::Cancelled;
        };
        if let Err(reason) = self.notifier.cancel(handle).await {
            log::warn!("cancelling reminder {} failed: {reason}", handle.as_str());
        }
        match store.clear_reminder(task.id, &ReminderState::Cancelled) {
            Ok(()) => ReminderOutcome::Cancelled,
            Err(e) => {
                log::error!("clearing reminder handle for task {} failed: {e}", task.id);
                ReminderOutcome::Failed(e.to_string())
            }
        }
    }

    /// Record that the platform delivered the reminder: the handle is stale
    /// from here on and reads must treat it as absent.
    pub fn mark_fired(&self, store: &Store, task: &TaskRecord) -> crate::error::Result<()> {
        store.clear_reminder(task.id, &ReminderState::Fired)
    }

    /// Best-effort cancellation of every pending platform reminder.
    pub async fn cancel_all(&self) -> ReminderOutcome {
        match self.notifier.cancel_all().await {
            Ok(()) => {
                log::info!("all reminders cancelled");
                ReminderOutcome::Cancelled
            }
            Err(reason) => {
                log::warn!("cancel-all failed: {reason}");
                ReminderOutcome::Failed(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::core::due::TimeOfDay;
    use crate::core::task::TaskDraft;
    use crate::core::user::NewUser;
    use crate::notify::ReminderHandle;

    /// In-memory stand-in for the platform notifier.
    struct MockNotifier {
        registered: Mutex<Vec<NotificationRequest>>,
        cancelled: Mutex<Vec<String>>,
        next_id: AtomicU32,
        fail_register: bool,
        reject_cancels: bool,
    }

    impl MockNotifier {
        fn new() -> Self {
            Self {
                registered: Mutex::new(Vec::new()),
                cancelled: Mutex::new(Vec::new()),
                next_id: AtomicU32::new(1),
                fail_register: false,
                reject_cancels: false,
            }
        }

        fn register_count(&self) -> usize {
            self.registered.lock().unwrap().len()
        }
    }

    impl Notifier for MockNotifier {
        async fn register(&self, request: &NotificationRequest) -> Result<ReminderHandle, String> {
            if self.fail_register {
                return Err("permission denied".into());
            }
            self.registered.lock().unwrap().push(request.clone());
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(ReminderHandle(format!("n-{id}")))
        }

        async fn cancel(&self, handle: &ReminderHandle) -> Result<(), String> {
            self.cancelled.lock().unwrap().push(handle.as_str().to_string());
            if self.reject_cancels {
                return Err(format!("unknown handle: {}", handle.as_str()));
            }
            Ok(())
        }

        async fn cancel_all(&self) -> Result<(), String> {
            Ok(())
        }
    }

    fn store_with_user() -> (Store, Uuid) {
        let store = Store::open_in_memory().unwrap();
        let user = store
            .insert_user(&NewUser {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password: "pw".into(),
            })
            .unwrap();
        (store, user.id)
    }

    fn task_at(store: &Store, uid: Uuid, date: NaiveDate, time: &str) -> TaskRecord {
        let mut draft = TaskDraft::new(uid, "water plants", date, TimeOfDay::parse(time).unwrap());
        draft.reminder_minutes = Some(5);
        store.insert_task(&draft).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn schedules_and_persists_handle() {
        let (store, uid) = store_with_user();
        let task = task_at(&store, uid, d(2024, 3, 10), "9:00 AM");
        let scheduler = ReminderScheduler::new(MockNotifier::new());
        let now = d(2024, 3, 10).and_hms_opt(8, 0, 0).unwrap();

        let outcome = scheduler.schedule_due(&store, &task, true, now).await;
        let handle = outcome.handle().expect("scheduled").clone();

        let reread = store.get_task(task.id).unwrap().unwrap();
        assert_eq!(reread.reminder, ReminderState::Scheduled(handle));
        // Trigger is due minus the lead time.
        let req = &scheduler.notifier().registered.lock().unwrap()[0];
        assert_eq!(req.trigger, d(2024, 3, 10).and_hms_opt(8, 55, 0).unwrap());
    }

    #[tokio::test]
    async fn past_trigger_skips_without_platform_call() {
        let (store, uid) = store_with_user();
        let task = task_at(&store, uid, d(2024, 3, 10), "9:00 AM");
        let scheduler = ReminderScheduler::new(MockNotifier::new());
        // Now is exactly the trigger instant: not strictly in the future.
        let now = d(2024, 3, 10).and_hms_opt(8, 55, 0).unwrap();

        let outcome = scheduler.schedule_due(&store, &task, true, now).await;
        assert_eq!(outcome, ReminderOutcome::SkippedPast);
        assert_eq!(scheduler.notifier().register_count(), 0);
        assert_eq!(
            store.get_task(task.id).unwrap().unwrap().reminder,
            ReminderState::None
        );
    }

    #[tokio::test]
    async fn disabled_session_makes_no_platform_call() {
        let (store, uid) = store_with_user();
        let task = task_at(&store, uid, d(2024, 3, 10), "9:00 AM");
        let scheduler = ReminderScheduler::new(MockNotifier::new());
        let now = d(2024, 3, 10).and_hms_opt(8, 0, 0).unwrap();

        let outcome = scheduler.schedule_due(&store, &task, false, now).await;
        assert_eq!(outcome, ReminderOutcome::Disabled);
        assert_eq!(scheduler.notifier().register_count(), 0);
    }

    #[tokio::test]
    async fn registration_failure_is_swallowed() {
        let (store, uid) = store_with_user();
        let task = task_at(&store, uid, d(2024, 3, 10), "9:00 AM");
        let mut notifier = MockNotifier::new();
        notifier.fail_register = true;
        let scheduler = ReminderScheduler::new(notifier);
        let now = d(2024, 3, 10).and_hms_opt(8, 0, 0).unwrap();

        let outcome = scheduler.schedule_due(&store, &task, true, now).await;
        assert!(matches!(outcome, ReminderOutcome::Failed(_)));
        // The task row is untouched: a task can exist with no reminder.
        assert_eq!(
            store.get_task(task.id).unwrap().unwrap().reminder,
            ReminderState::None
        );
    }

    #[tokio::test]
    async fn failed_persist_cancels_orphan_registration() {
        let (store, uid) = store_with_user();
        let task = task_at(&store, uid, d(2024, 3, 10), "9:00 AM");
        let scheduler = ReminderScheduler::new(MockNotifier::new());
        let now = d(2024, 3, 10).and_hms_opt(8, 0, 0).unwrap();

        // Break the persist step after the task row was captured.
        store.conn().execute_batch("DROP TABLE tasks").unwrap();

        let outcome = scheduler.schedule_due(&store, &task, true, now).await;
        assert!(matches!(outcome, ReminderOutcome::Failed(_)));
        let cancelled = scheduler.notifier().cancelled.lock().unwrap();
        assert_eq!(cancelled.as_slice(), ["n-1"]);
    }

    #[tokio::test]
    async fn missed_reminder_fires_one_minute_after_due() {
        let (store, uid) = store_with_user();
        let task = task_at(&store, uid, d(2024, 3, 10), "9:00 AM");
        let scheduler = ReminderScheduler::new(MockNotifier::new());
        let now = d(2024, 3, 10).and_hms_opt(8, 0, 0).unwrap();

        let outcome = scheduler.schedule_missed(&task, true, now).await;
        assert!(outcome.handle().is_some());
        let req = &scheduler.notifier().registered.lock().unwrap()[0];
        assert_eq!(req.trigger, d(2024, 3, 10).and_hms_opt(9, 1, 0).unwrap());
        assert!(req.body.contains("missed"));
        // The missed handle is not persisted on the row.
        assert_eq!(
            store.get_task(task.id).unwrap().unwrap().reminder,
            ReminderState::None
        );
    }

    #[tokio::test]
    async fn cancel_without_handle_is_a_no_op() {
        let (store, uid) = store_with_user();
        let task = task_at(&store, uid, d(2024, 3, 10), "9:00 AM");
        let scheduler = ReminderScheduler::new(MockNotifier::new());

        let outcome = scheduler.cancel(&store, &task).await;
        assert_eq!(outcome, ReminderOutcome::Cancelled);
        assert!(scheduler.notifier().cancelled.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_swallows_unknown_handle_rejection() {
        let (store, uid) = store_with_user();
        let mut task = task_at(&store, uid, d(2024, 3, 10), "9:00 AM");
        let handle = ReminderHandle("n-unknown".into());
        store.set_reminder(task.id, &handle).unwrap();
        task.reminder = ReminderState::Scheduled(handle);

        let mut notifier = MockNotifier::new();
        notifier.reject_cancels = true;
        let scheduler = ReminderScheduler::new(notifier);

        let outcome = scheduler.cancel(&store, &task).await;
        assert_eq!(outcome, ReminderOutcome::Cancelled);
        // The stale handle is gone from the row.
        assert_eq!(
            store.get_task(task.id).unwrap().unwrap().reminder,
            ReminderState::Cancelled
        );
    }

    #[tokio::test]
    async fn mark_fired_clears_the_handle() {
        let (store, uid) = store_with_user();
        let task = task_at(&store, uid, d(2024, 3, 10), "9:00 AM");
        store.set_reminder(task.id, &ReminderHandle("n-1".into())).unwrap();
        let scheduler = ReminderScheduler::new(MockNotifier::new());

        scheduler.mark_fired(&store, &task).unwrap();
        assert_eq!(
            store.get_task(task.id).unwrap().unwrap().reminder,
            ReminderState::Fired
        );
    }
}
