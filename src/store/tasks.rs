use chrono::{NaiveDate, NaiveTime};
use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::core::due::{self, TimeOfDay};
use crate::core::repeat::Repeat;
use crate::core::task::{Category, ListTab, Status, TaskDraft, TaskRecord, TypeFilter};
use crate::error::{Error, Result};
use crate::notify::{ReminderHandle, ReminderState};

use super::{DATE_FMT, Store, conversion_err};

fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(conversion_err)
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    let id: String = row.get("id")?;
    let user_id: String = row.get("user_id")?;
    let date: String = row.get("date")?;
    let time: String = row.get("time")?;
    let category: String = row.get("category")?;
    let status: String = row.get("status")?;
    let frequency: String = row.get("repeat_frequency")?;
    let repeat_days: Option<String> = row.get("repeat_days")?;
    let start_date: Option<String> = row.get("start_date")?;
    let end_date: Option<String> = row.get("end_date")?;
    let reminder_state: String = row.get("reminder_state")?;
    let notification_id: Option<String> = row.get("notification_id")?;
    let reminder_minutes: Option<i64> = row.get("reminder_minutes")?;

    Ok(TaskRecord {
        id: Uuid::parse_str(&id).map_err(conversion_err)?,
        user_id: Uuid::parse_str(&user_id).map_err(conversion_err)?,
        title: row.get("title")?,
        description: row.get("description")?,
        category: Category::from_keyword(&category).unwrap_or(Category::Task),
        date: parse_date(&date)?,
        time: TimeOfDay::new(
            NaiveTime::parse_from_str(&time, "%I:%M %p").map_err(conversion_err)?,
        ),
        location: row.get("location")?,
        status: Status::from_keyword(&status).unwrap_or(Status::Pending),
        repeat: Repeat::from_columns(&frequency, repeat_days.as_deref()),
        start_date: start_date.as_deref().map(parse_date).transpose()?,
        end_date: end_date.as_deref().map(parse_date).transpose()?,
        reminder_minutes: reminder_minutes.map(|m| m as u32),
        reminder: ReminderState::from_columns(&reminder_state, notification_id),
    })
}

impl Store {
    /// Persist a new task or schedule. Fails with a validation error when
    /// the title is blank or the owning user does not exist; nothing is
    /// written in either case.
    pub fn insert_task(&self, draft: &TaskDraft) -> Result<TaskRecord> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(Error::validation("task title is required"));
        }
        if self.get_user(draft.user_id)?.is_none() {
            return Err(Error::validation("owning user not found"));
        }

        // Start/end dates only make sense for schedule kinds.
        let is_schedule = draft.category.kind() == crate::core::task::Kind::Schedule;
        let start_date = draft.start_date.filter(|_| is_schedule);
        let end_date = draft.end_date.filter(|_| is_schedule);

        let record = TaskRecord {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            title: title.to_string(),
            description: draft.description.clone(),
            category: draft.category,
            date: draft.date,
            time: draft.time,
            location: draft.location.clone(),
            status: Status::Pending,
            repeat: draft.repeat.clone(),
            start_date,
            end_date,
            reminder_minutes: draft.reminder_minutes,
            reminder: ReminderState::None,
        };

        self.conn().execute(
            "INSERT INTO tasks (id, user_id, title, description, category, date, time,
             location, status, repeat_frequency, repeat_days, start_date, end_date,
             reminder_minutes, notification_id, reminder_state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, NULL, 'none')",
            params![
                record.id.to_string(),
                record.user_id.to_string(),
                record.title,
                record.description,
                record.category.as_keyword(),
                record.date.format(DATE_FMT).to_string(),
                record.time.to_string(),
                record.location,
                record.status.as_keyword(),
                record.repeat.frequency(),
                record.repeat.days_column(),
                record.start_date.map(|d| d.format(DATE_FMT).to_string()),
                record.end_date.map(|d| d.format(DATE_FMT).to_string()),
                record.reminder_minutes,
            ],
        )?;

        Ok(record)
    }

    pub fn get_task(&self, task_id: Uuid) -> Result<Option<TaskRecord>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT * FROM tasks WHERE id = ?1",
                params![task_id.to_string()],
                task_from_row,
            )
            .optional()?)
    }

    /// The tab/type-filtered list backing the home view.
    pub fn list_tasks(
        &self,
        user_id: Uuid,
        tab: ListTab,
        type_filter: TypeFilter,
        today: NaiveDate,
    ) -> Result<Vec<TaskRecord>> {
        let mut sql = String::from("SELECT * FROM tasks WHERE user_id = ?1");
        let needs_date = match tab {
            ListTab::All => false,
            ListTab::Today => {
                sql.push_str(" AND date = ?2");
                true
            }
            ListTab::Upcoming => {
                sql.push_str(" AND date > ?2 AND status != 'done'");
                true
            }
            ListTab::Completed => {
                sql.push_str(" AND status = 'done'");
                false
            }
        };
        match type_filter {
            TypeFilter::All => {}
            TypeFilter::Task => sql.push_str(" AND category = 'Task'"),
            TypeFilter::Schedule => sql.push_str(" AND category != 'Task'"),
        }
        sql.push_str(" ORDER BY date, id");

        let uid = user_id.to_string();
        let today_str = today.format(DATE_FMT).to_string();
        let mut stmt = self.conn().prepare(&sql)?;
        let tasks = if needs_date {
            stmt.query_map(params![uid, today_str], task_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            stmt.query_map(params![uid], task_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(tasks)
    }

    /// Pending rows from today on, closest due instant first, capped at
    /// `limit`. This is the context window for the recommendation prompt.
    pub fn upcoming_context(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        limit: usize,
    ) -> Result<Vec<TaskRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT * FROM tasks WHERE user_id = ?1 AND date >= ?2 AND status != 'done'",
        )?;
        let mut tasks = stmt
            .query_map(
                params![user_id.to_string(), today.format(DATE_FMT).to_string()],
                task_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        tasks.sort_by_key(|t| due::due_instant(t.date, t.time));
        tasks.truncate(limit);
        Ok(tasks)
    }

    /// Set a task's status. The only forward transition is pending → done;
    /// a done row stays done, so marking done twice is a harmless no-op and
    /// an attempted un-done is ignored.
    pub fn update_status(&self, task_id: Uuid, status: Status) -> Result<()> {
        let changed = match status {
            Status::Done => self.conn().execute(
                "UPDATE tasks SET status = 'done' WHERE id = ?1",
                params![task_id.to_string()],
            )?,
            Status::Pending => self.conn().execute(
                "UPDATE tasks SET status = 'pending' WHERE id = ?1 AND status != 'done'",
                params![task_id.to_string()],
            )?,
        };
        if changed == 0 {
            log::debug!("update_status: no row changed for task {task_id}");
        }
        Ok(())
    }

    /// Record a freshly registered reminder handle on the task row.
    pub fn set_reminder(&self, task_id: Uuid, handle: &ReminderHandle) -> Result<()> {
        self.conn().execute(
            "UPDATE tasks SET notification_id = ?1, reminder_state = 'scheduled' WHERE id = ?2",
            params![handle.as_str(), task_id.to_string()],
        )?;
        Ok(())
    }

    /// Drop the stored handle, recording why it is gone. Handles never
    /// outlive a cancellation or a firing.
    pub fn clear_reminder(&self, task_id: Uuid, state: &ReminderState) -> Result<()> {
        self.conn().execute(
            "UPDATE tasks SET notification_id = NULL, reminder_state = ?1 WHERE id = ?2",
            params![state.as_keyword(), task_id.to_string()],
        )?;
        Ok(())
    }
}
