//! Study tools exposed to the agent.
//!
//! Each tool takes a JSON object of arguments and answers with either
//! `{"status": "success", ...}` or a tagged error
//! `{"status": "error", "error_kind": ..., "error_message": ...}`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use studymate_core::{Date, ReminderId};
use studymate_progress::{
    create_learning_schedule, format_report, parse_date, render_text, LedgerError, StudyService,
};
use tracing::debug;

use crate::mcp_server::McpTool;

/// Tool names.
pub mod names {
    /// Record a milestone status
    pub const TRACK_MILESTONE: &str = "track_milestone_completion";
    /// Roadmap progress report
    pub const PROGRESS_REPORT: &str = "get_progress_report";
    /// Schedule a reminder
    pub const SCHEDULE_REMINDER: &str = "schedule_reminder";
    /// List reminders
    pub const LIST_REMINDERS: &str = "list_reminders";
    /// Cancel a reminder
    pub const CANCEL_REMINDER: &str = "cancel_reminder";
    /// Fire due reminders
    pub const FIRE_DUE: &str = "fire_due_reminders";
    /// Save quiz results
    pub const SAVE_QUIZ: &str = "save_quiz_results";
    /// Learning schedule arithmetic
    pub const LEARNING_SCHEDULE: &str = "create_learning_schedule";
}

/// Errors that prevent a tool from being dispatched at all.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// No tool with that name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

#[derive(Deserialize)]
struct TrackMilestoneArgs {
    roadmap_id: String,
    milestone_name: String,
    status: String,
}

#[derive(Deserialize)]
struct RoadmapArgs {
    roadmap_id: String,
}

#[derive(Deserialize)]
struct ScheduleReminderArgs {
    reminder_message: String,
    reminder_date: String,
}

#[derive(Deserialize)]
struct ReminderIdArgs {
    reminder_id: String,
}

#[derive(Deserialize)]
struct FireDueArgs {
    #[serde(default)]
    today: Option<String>,
}

#[derive(Deserialize)]
struct QuizArgs {
    quiz_id: String,
    score: u32,
    total: u32,
}

#[derive(Deserialize)]
struct ScheduleArgs {
    topic: String,
    days_available: u32,
    hours_per_day: u32,
    #[serde(default)]
    start_date: Option<String>,
}

/// Dispatches tool calls to the study service.
#[derive(Clone)]
pub struct ToolRouter {
    service: StudyService,
}

impl ToolRouter {
    /// Create a router over `service`.
    pub fn new(service: StudyService) -> Self {
        Self { service }
    }

    /// Definitions of every tool, for `tools/list`.
    pub fn definitions() -> Vec<McpTool> {
        vec![
            McpTool {
                name: names::TRACK_MILESTONE.to_string(),
                description: "Record the status of a learning milestone and recompute roadmap completion".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "roadmap_id": {"type": "string", "description": "Learning roadmap identifier"},
                        "milestone_name": {"type": "string", "description": "Milestone name"},
                        "status": {
                            "type": "string",
                            "enum": ["completed", "in_progress", "not_started"]
                        }
                    },
                    "required": ["roadmap_id", "milestone_name", "status"]
                }),
            },
            McpTool {
                name: names::PROGRESS_REPORT.to_string(),
                description: "Report completed, current and upcoming milestones of a roadmap".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "roadmap_id": {"type": "string", "description": "Learning roadmap identifier"}
                    },
                    "required": ["roadmap_id"]
                }),
            },
            McpTool {
                name: names::SCHEDULE_REMINDER.to_string(),
                description: "Schedule a study reminder".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "reminder_message": {"type": "string", "description": "Reminder text"},
                        "reminder_date": {"type": "string", "description": "Due date (YYYY-MM-DD)"}
                    },
                    "required": ["reminder_message", "reminder_date"]
                }),
            },
            McpTool {
                name: names::LIST_REMINDERS.to_string(),
                description: "List all scheduled reminders".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            McpTool {
                name: names::CANCEL_REMINDER.to_string(),
                description: "Cancel a scheduled reminder".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "reminder_id": {"type": "string", "description": "Reminder ID"}
                    },
                    "required": ["reminder_id"]
                }),
            },
            McpTool {
                name: names::FIRE_DUE.to_string(),
                description: "Mark reminders due on or before a day as fired and return them".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "today": {"type": "string", "description": "Day to check (YYYY-MM-DD), defaults to today"}
                    }
                }),
            },
            McpTool {
                name: names::SAVE_QUIZ.to_string(),
                description: "Save the score of a completed quiz".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "quiz_id": {"type": "string", "description": "Quiz identifier"},
                        "score": {"type": "integer", "minimum": 0, "description": "Correct answers"},
                        "total": {"type": "integer", "minimum": 0, "description": "Questions asked"}
                    },
                    "required": ["quiz_id", "score", "total"]
                }),
            },
            McpTool {
                name: names::LEARNING_SCHEDULE.to_string(),
                description: "Compute the time budget for learning a topic".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "topic": {"type": "string"},
                        "days_available": {"type": "integer", "minimum": 1},
                        "hours_per_day": {"type": "integer", "minimum": 1, "maximum": 24},
                        "start_date": {"type": "string", "description": "First day (YYYY-MM-DD), defaults to today"}
                    },
                    "required": ["topic", "days_available", "hours_per_day"]
                }),
            },
        ]
    }

    /// Run a tool. Ledger failures are reported inside the returned value;
    /// only an unknown tool name is an `Err`.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        debug!("Tool call: {} with args: {}", name, arguments);
        let outcome = match name {
            names::TRACK_MILESTONE => self.track_milestone(arguments).await,
            names::PROGRESS_REPORT => self.progress_report(arguments).await,
            names::SCHEDULE_REMINDER => self.schedule_reminder(arguments).await,
            names::LIST_REMINDERS => self.list_reminders().await,
            names::CANCEL_REMINDER => self.cancel_reminder(arguments).await,
            names::FIRE_DUE => self.fire_due(arguments).await,
            names::SAVE_QUIZ => self.save_quiz(arguments).await,
            names::LEARNING_SCHEDULE => learning_schedule(arguments),
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };
        Ok(outcome.unwrap_or_else(|e| error_payload(&e)))
    }

    async fn track_milestone(&self, arguments: Value) -> Result<Value, LedgerError> {
        let args: TrackMilestoneArgs = parse_args(arguments)?;
        let progress = self
            .service
            .ledger
            .record_milestone(&args.roadmap_id, &args.milestone_name, &args.status)
            .await?;
        Ok(json!({ "status": "success", "progress_data": progress }))
    }

    async fn progress_report(&self, arguments: Value) -> Result<Value, LedgerError> {
        let args: RoadmapArgs = parse_args(arguments)?;
        let report = self.service.ledger.get_report(&args.roadmap_id).await?;
        let view = format_report(&report)?;
        let text = render_text(&view);
        Ok(json!({ "status": "success", "report": report, "display": view, "text": text }))
    }

    async fn schedule_reminder(&self, arguments: Value) -> Result<Value, LedgerError> {
        let args: ScheduleReminderArgs = parse_args(arguments)?;
        let date = parse_date(&args.reminder_date)?;
        let reminder = self
            .service
            .reminders
            .schedule_reminder(&args.reminder_message, date)
            .await?;
        Ok(json!({ "status": "success", "reminder": reminder }))
    }

    async fn list_reminders(&self) -> Result<Value, LedgerError> {
        let reminders = self.service.reminders.list_reminders().await?;
        Ok(json!({ "status": "success", "reminders": reminders }))
    }

    async fn cancel_reminder(&self, arguments: Value) -> Result<Value, LedgerError> {
        let args: ReminderIdArgs = parse_args(arguments)?;
        let id = parse_reminder_id(&args.reminder_id)?;
        let reminder = self.service.reminders.cancel_reminder(id).await?;
        Ok(json!({ "status": "success", "reminder": reminder }))
    }

    async fn fire_due(&self, arguments: Value) -> Result<Value, LedgerError> {
        let args: FireDueArgs = parse_args(arguments)?;
        let today = date_or_today(args.today.as_deref())?;
        let fired = self.service.reminders.fire_due(today).await?;
        Ok(json!({ "status": "success", "fired": fired }))
    }

    async fn save_quiz(&self, arguments: Value) -> Result<Value, LedgerError> {
        let args: QuizArgs = parse_args(arguments)?;
        let results = self
            .service
            .quizzes
            .save_results(&args.quiz_id, args.score, args.total)
            .await?;
        Ok(json!({ "status": "success", "results": results }))
    }
}

fn learning_schedule(arguments: Value) -> Result<Value, LedgerError> {
    let args: ScheduleArgs = parse_args(arguments)?;
    let start = date_or_today(args.start_date.as_deref())?;
    let schedule = create_learning_schedule(&args.topic, args.days_available, args.hours_per_day, start)?;
    Ok(json!({ "status": "success", "schedule": schedule }))
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, LedgerError> {
    // A call with no arguments arrives as null
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments)
        .map_err(|e| LedgerError::Validation(format!("invalid arguments: {}", e)))
}

fn parse_reminder_id(s: &str) -> Result<ReminderId, LedgerError> {
    s.trim()
        .parse()
        .map_err(|e| LedgerError::Validation(format!("invalid reminder id '{}': {}", s, e)))
}

fn date_or_today(s: Option<&str>) -> Result<Date, LedgerError> {
    match s {
        Some(s) => parse_date(s),
        None => Ok(chrono::Utc::now().date_naive()),
    }
}

fn error_payload(e: &LedgerError) -> Value {
    let tagged = e.to_tagged();
    json!({
        "status": "error",
        "error_kind": tagged.kind,
        "error_message": tagged.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use studymate_storage::MemoryStore;

    fn router() -> ToolRouter {
        ToolRouter::new(StudyService::new(Arc::new(MemoryStore::new())))
    }

    #[test]
    fn test_definitions_are_unique() {
        let defs = ToolRouter::definitions();
        let mut names: Vec<_> = defs.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), defs.len());
        assert!(defs.iter().all(|t| t.input_schema["type"] == "object"));
    }

    #[tokio::test]
    async fn test_track_then_report() {
        let router = router();
        let tracked = router
            .call(
                names::TRACK_MILESTONE,
                json!({"roadmap_id": "py101", "milestone_name": "intro", "status": "completed"}),
            )
            .await
            .unwrap();
        assert_eq!(tracked["status"], "success");
        assert_eq!(tracked["progress_data"]["completion_percentage"], 100.0);

        let report = router
            .call(names::PROGRESS_REPORT, json!({"roadmap_id": "py101"}))
            .await
            .unwrap();
        assert_eq!(report["report"]["completed"], 1);
        assert_eq!(report["display"]["percentage_label"], "100.0%");
        assert!(report["text"].as_str().unwrap().contains("📅 Upcoming: none yet"));
    }

    #[tokio::test]
    async fn test_missing_report_is_tagged_not_found() {
        let result = router()
            .call(names::PROGRESS_REPORT, json!({"roadmap_id": "nope"}))
            .await
            .unwrap();
        assert_eq!(result["status"], "error");
        assert_eq!(result["error_kind"], "not_found");
    }

    #[tokio::test]
    async fn test_bad_arguments_are_validation_errors() {
        let router = router();
        let result = router
            .call(names::TRACK_MILESTONE, json!({"roadmap_id": "py101"}))
            .await
            .unwrap();
        assert_eq!(result["error_kind"], "validation");

        let result = router
            .call(
                names::SCHEDULE_REMINDER,
                json!({"reminder_message": "Review", "reminder_date": "tomorrow"}),
            )
            .await
            .unwrap();
        assert_eq!(result["error_kind"], "validation");

        let result = router
            .call(names::CANCEL_REMINDER, json!({"reminder_id": "xyz"}))
            .await
            .unwrap();
        assert_eq!(result["error_kind"], "validation");
    }

    #[tokio::test]
    async fn test_reminder_lifecycle() {
        let router = router();
        let scheduled = router
            .call(
                names::SCHEDULE_REMINDER,
                json!({"reminder_message": "Review loops", "reminder_date": "2024-03-01"}),
            )
            .await
            .unwrap();
        let id = scheduled["reminder"]["reminder_id"].as_str().unwrap().to_string();

        let listed = router.call(names::LIST_REMINDERS, Value::Null).await.unwrap();
        assert_eq!(listed["reminders"].as_array().unwrap().len(), 1);

        let fired = router
            .call(names::FIRE_DUE, json!({"today": "2024-03-01"}))
            .await
            .unwrap();
        assert_eq!(fired["fired"][0]["status"], "fired");

        let cancelled = router
            .call(names::CANCEL_REMINDER, json!({"reminder_id": id}))
            .await
            .unwrap();
        assert_eq!(cancelled["error_kind"], "validation");
    }

    #[tokio::test]
    async fn test_quiz_and_schedule() {
        let router = router();
        let quiz = router
            .call(names::SAVE_QUIZ, json!({"quiz_id": "q1", "score": 3, "total": 4}))
            .await
            .unwrap();
        assert_eq!(quiz["results"]["percentage"], 75.0);

        let schedule = router
            .call(
                names::LEARNING_SCHEDULE,
                json!({"topic": "ML", "days_available": 30, "hours_per_day": 2, "start_date": "2024-03-01"}),
            )
            .await
            .unwrap();
        assert_eq!(schedule["schedule"]["total_hours"], 60);
        assert_eq!(schedule["schedule"]["estimated_completion"], "2024-03-31");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = router().call("teach_me", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }
}
