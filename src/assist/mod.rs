use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::due::TimeOfDay;
use crate::core::task::{TaskDraft, TaskRecord};
use crate::error::{Error, Result};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// At most this many context tasks are embedded in the prompt.
pub const MAX_CONTEXT_TASKS: usize = 50;

/// A proposed schedule slot returned by the hosted model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub reason: String,
}

impl Recommendation {
    /// Check the date/time fields against the formats the prompt demanded.
    pub fn validate(&self) -> Result<(NaiveDate, TimeOfDay)> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| Error::recommendation(format!("bad date {:?}: {e}", self.date)))?;
        let time = TimeOfDay::parse(&self.time)
            .ok_or_else(|| Error::recommendation(format!("bad time {:?}", self.time)))?;
        Ok((date, time))
    }

    /// Turn the proposal into an add-form prefill for `user_id`.
    pub fn into_draft(self, user_id: Uuid) -> Result<TaskDraft> {
        let (date, time) = self.validate()?;
        let mut draft = TaskDraft::new(user_id, self.title, date, time);
        draft.description = Some(self.description).filter(|d| !d.is_empty());
        Ok(draft)
    }
}

/// The slice of a task the model gets to see.
#[derive(Debug, Serialize)]
struct ContextTask<'a> {
    title: &'a str,
    category: &'a str,
    date: String,
    time: String,
    status: &'a str,
}

impl<'a> ContextTask<'a> {
    fn from_record(task: &'a TaskRecord) -> Self {
        Self {
            title: &task.title,
            category: task.category.as_keyword(),
            date: task.date.format("%Y-%m-%d").to_string(),
            time: task.time.to_string(),
            status: task.status.as_keyword(),
        }
    }
}

/// Client for the hosted model that proposes a schedule slot from a
/// free-text request. One shot; a failed call surfaces immediately and the
/// caller decides whether to resubmit.
pub struct RecommendationClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl RecommendationClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Ask for a conflict-free slot given the user's upcoming tasks and
    /// request text. `now` anchors the prompt's notion of the current
    /// date and time.
    pub async fn recommend(
        &self,
        context_tasks: &[TaskRecord],
        request_text: &str,
        now: NaiveDateTime,
    ) -> Result<Recommendation> {
        if request_text.trim().is_empty() {
            return Err(Error::validation("request text is required"));
        }

        let prompt = build_prompt(context_tasks, request_text, now);
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 400,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        let resp = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::recommendation(format!("API request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::recommendation(format!("API error {status}: {text}")));
        }

        let api_resp: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::recommendation(format!("failed to parse API response: {e}")))?;

        let text = api_resp["content"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|block| block["text"].as_str())
            .ok_or_else(|| Error::recommendation("no text in API response"))?;

        parse_recommendation(text)
    }
}

/// Deterministic prompt: current date/time, the serialized context tasks,
/// the verbatim request, and the JSON-only output contract.
fn build_prompt(context_tasks: &[TaskRecord], request_text: &str, now: NaiveDateTime) -> String {
    let context: Vec<ContextTask<'_>> = context_tasks
        .iter()
        .take(MAX_CONTEXT_TASKS)
        .map(ContextTask::from_record)
        .collect();
    let context_json = serde_json::to_string(&context).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a smart scheduling assistant.\n\n\
         Current date & time: {date} {time}\n\
         Existing tasks: {context_json}\n\n\
         User request: \"{request_text}\"\n\n\
         Analyze the schedule and suggest the best conflict-free time for the request.\n\
         Return ONLY a valid JSON object. No markdown, no backticks.\n\
         Structure:\n\
         {{\n\
           \"title\": \"Task Title\",\n\
           \"description\": \"Brief description\",\n\
           \"date\": \"YYYY-MM-DD\",\n\
           \"time\": \"HH:MM AM/PM\",\n\
           \"reason\": \"Why this time works\"\n\
         }}\n",
        date = now.format("%Y-%m-%d"),
        time = now.format("%-I:%M %p"),
    )
}

/// Strip markdown code fences the model may add despite instructions.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_recommendation(text: &str) -> Result<Recommendation> {
    serde_json::from_str(strip_code_fences(text))
        .map_err(|e| Error::recommendation(format!("failed to parse recommendation: {e} — raw: {text}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::due::TimeOfDay;

    const RAW: &str = r#"{"title":"Dentist","description":"Checkup","date":"2024-03-11","time":"10:00 AM","reason":"Morning is free"}"#;

    #[test]
    fn fenced_and_bare_json_parse_identically() {
        let bare = parse_recommendation(RAW).unwrap();
        let fenced = parse_recommendation(&format!("```json\n{RAW}\n```")).unwrap();
        let plain_fence = parse_recommendation(&format!("```\n{RAW}\n```")).unwrap();
        assert_eq!(bare, fenced);
        assert_eq!(bare, plain_fence);
        assert_eq!(bare.title, "Dentist");
    }

    #[test]
    fn missing_field_is_a_recommendation_error() {
        let err = parse_recommendation(r#"{"title":"Dentist"}"#).unwrap_err();
        assert!(matches!(err, Error::Recommendation(_)));
        let err = parse_recommendation("not json at all").unwrap_err();
        assert!(matches!(err, Error::Recommendation(_)));
    }

    #[test]
    fn validate_checks_wire_formats() {
        let rec = parse_recommendation(RAW).unwrap();
        let (date, time) = rec.validate().unwrap();
        assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(time, TimeOfDay::parse("10:00 AM").unwrap());

        let mut bad = parse_recommendation(RAW).unwrap();
        bad.date = "11/03/2024".into();
        assert!(bad.validate().is_err());
        let mut bad = parse_recommendation(RAW).unwrap();
        bad.time = "25:00".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn draft_prefill_carries_the_proposal() {
        let rec = parse_recommendation(RAW).unwrap();
        let uid = uuid::Uuid::new_v4();
        let draft = rec.into_draft(uid).unwrap();
        assert_eq!(draft.user_id, uid);
        assert_eq!(draft.title, "Dentist");
        assert_eq!(draft.description.as_deref(), Some("Checkup"));
    }

    #[test]
    fn prompt_embeds_context_and_request() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let prompt = build_prompt(&[], "book a dentist appointment", now);
        assert!(prompt.contains("2024-03-10 2:30 PM"));
        assert!(prompt.contains("\"book a dentist appointment\""));
        assert!(prompt.contains("Return ONLY a valid JSON object"));
        // Deterministic for identical inputs.
        assert_eq!(prompt, build_prompt(&[], "book a dentist appointment", now));
    }

    #[test]
    fn prompt_caps_context_at_fifty() {
        use crate::core::task::TaskDraft;
        let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let uid = uuid::Uuid::new_v4();
        let tasks: Vec<TaskRecord> = (0..60)
            .map(|i| {
                let draft = TaskDraft::new(
                    uid,
                    format!("task-{i:02}"),
                    chrono::NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
                    TimeOfDay::parse("9:00 AM").unwrap(),
                );
                TaskRecord {
                    id: uuid::Uuid::new_v4(),
                    user_id: draft.user_id,
                    title: draft.title.clone(),
                    description: None,
                    category: draft.category,
                    date: draft.date,
                    time: draft.time,
                    location: None,
                    status: crate::core::task::Status::Pending,
                    repeat: crate::core::repeat::Repeat::None,
                    start_date: None,
                    end_date: None,
                    reminder_minutes: None,
                    reminder: crate::notify::ReminderState::None,
                }
            })
            .collect();

        let prompt = build_prompt(&tasks, "find me a slot", now);
        assert!(prompt.contains("task-49"));
        assert!(!prompt.contains("task-50"));
    }
}
