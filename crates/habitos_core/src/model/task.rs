use super::day::parse_day;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// A dated, single-occurrence unit of work, optionally linked to a habit.
///
/// `date` keeps the raw persisted text so that a malformed value survives a
/// load/save cycle; use [`Task::day`] to get the parsed calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub date: String,
    pub habit_id: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub note: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// The assigned calendar day, or `None` when `date` is not `YYYY-MM-DD`.
    pub fn day(&self) -> Option<Date> {
        parse_day(&self.date)
    }

    pub fn belongs_to(&self, habit_id: &str) -> bool {
        self.habit_id.as_deref() == Some(habit_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(AppError::invalid_input(format!(
                "priority must be low, medium or high, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    Ongoing,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::NotStarted, Self::Ongoing, Self::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "not-started" => Ok(Self::NotStarted),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            other => Err(AppError::invalid_input(format!(
                "status must be not-started, ongoing or completed, got '{other}'"
            ))),
        }
    }
}

/// Persisted shape of a task. Carries the legacy `completed` flag next to
/// `status` so that older readers keep working.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: String,
    title: String,
    date: String,
    #[serde(default)]
    habit_id: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    updated_at: Option<OffsetDateTime>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        // The boolean wins when both are present: older builds toggled it
        // without touching `status`.
        let status = match (record.completed, record.status) {
            (Some(true), _) => TaskStatus::Completed,
            (Some(false), Some(TaskStatus::Completed)) => TaskStatus::NotStarted,
            (_, Some(status)) => status,
            (_, None) => TaskStatus::NotStarted,
        };

        Task {
            id: record.id,
            title: record.title,
            date: record.date,
            habit_id: record.habit_id.filter(|id| !id.trim().is_empty()),
            priority: record.priority,
            status,
            note: record.note,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        TaskRecord {
            completed: Some(task.is_completed()),
            status: Some(task.status),
            id: task.id,
            title: task.title,
            date: task.date,
            habit_id: task.habit_id,
            priority: task.priority,
            note: task.note,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Task, TaskStatus};
    use time::macros::{date, datetime};

    fn sample() -> Task {
        Task {
            id: "t1".to_string(),
            title: "Solve DSA problems".to_string(),
            date: "2025-12-20".to_string(),
            habit_id: None,
            priority: Priority::High,
            status: TaskStatus::Ongoing,
            note: Some("Focus on graphs".to_string()),
            created_at: Some(datetime!(2025-12-20 08:30:00 UTC)),
            updated_at: None,
        }
    }

    #[test]
    fn null_habit_id_survives_round_trip() {
        let task = sample();
        let json = serde_json::to_value(&task).unwrap();
        assert!(json["habitId"].is_null());
        assert!(json.as_object().unwrap().contains_key("habitId"));

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
        assert_eq!(back.habit_id, None);
    }

    #[test]
    fn writes_camel_case_and_derived_completed_flag() {
        let mut task = sample();
        task.habit_id = Some("h1".to_string());
        task.status = TaskStatus::Completed;

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["habitId"], "h1");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["completed"], true);
        assert_eq!(json["priority"], "high");
        assert_eq!(json["createdAt"], "2025-12-20T08:30:00Z");
    }

    #[test]
    fn legacy_record_without_status_uses_completed_flag() {
        let json = r#"{"id":"t1","title":"demo","date":"2025-12-20","habitId":"h1","priority":"high","note":"x","completed":true}"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.is_completed());
        assert_eq!(task.created_at, None);
    }

    #[test]
    fn completed_flag_overrides_stale_status() {
        let toggled_off = r#"{"id":"t1","title":"demo","date":"2025-12-20","status":"completed","completed":false}"#;
        let task: Task = serde_json::from_str(toggled_off).unwrap();
        assert_eq!(task.status, TaskStatus::NotStarted);

        let toggled_on = r#"{"id":"t2","title":"demo","date":"2025-12-20","status":"ongoing","completed":true}"#;
        let task: Task = serde_json::from_str(toggled_on).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let json = r#"{"id":"t1","title":"demo","date":"2025-12-20"}"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.habit_id, None);
        assert_eq!(task.note, None);
    }

    #[test]
    fn blank_habit_id_is_treated_as_unlinked() {
        let json = r#"{"id":"t1","title":"demo","date":"2025-12-20","habitId":""}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.habit_id, None);
    }

    #[test]
    fn day_parses_or_rejects_date_text() {
        let mut task = sample();
        assert_eq!(task.day(), Some(date!(2025 - 12 - 20)));

        task.date = "someday".to_string();
        assert_eq!(task.day(), None);
    }

    #[test]
    fn status_and_priority_parse_from_text() {
        assert_eq!("not_started".parse::<TaskStatus>().unwrap(), TaskStatus::NotStarted);
        assert_eq!("Ongoing".parse::<TaskStatus>().unwrap(), TaskStatus::Ongoing);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("urgent".parse::<Priority>().unwrap_err().code(), "invalid_input");
    }
}
