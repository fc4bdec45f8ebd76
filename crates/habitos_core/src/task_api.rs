use crate::error::AppError;
use crate::model::{Priority, Task, TaskStatus, format_day, parse_day};
use crate::state::AppState;
use crate::storage::KeyValueStore;
use crate::workspace::{Changed, Workspace};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Input for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub date: String,
    pub habit_id: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub note: Option<String>,
}

impl TaskDraft {
    pub fn new<T: Into<String>>(title: T, date: Date) -> Self {
        Self {
            title: title.into(),
            date: format_day(date),
            ..Self::default()
        }
    }
}

/// Partial update. `None` leaves a field alone; for the nullable fields,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub date: Option<String>,
    pub habit_id: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub note: Option<Option<String>>,
}

impl<S: KeyValueStore> Workspace<S> {
    pub fn list_tasks(&self) -> &[Task] {
        &self.state().tasks
    }

    pub fn get_task(&self, id: &str) -> Result<Task, AppError> {
        let id = require_id(id)?;
        self.state()
            .task(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")))
    }

    /// Tasks assigned to `date`, in insertion order.
    pub fn tasks_for_date(&self, date: Date) -> Vec<Task> {
        crate::filters::tasks_on(&self.state().tasks, date)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn create_task(&mut self, draft: TaskDraft) -> Result<Task, AppError> {
        let title = normalize_title(&draft.title)?;
        let date = normalize_date(&draft.date)?;
        let habit_id = normalize_habit_ref(self.state(), draft.habit_id.as_deref())?;
        let now = OffsetDateTime::now_utc();

        let task = Task {
            id: Uuid::new_v4().to_string(),
            title,
            date,
            habit_id,
            priority: draft.priority,
            status: draft.status,
            note: normalize_note(draft.note.as_deref()),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let next = self.state().with_task_created(task.clone());
        self.commit(next, Changed::TASKS)?;
        tracing::debug!(task_id = %task.id, date = %task.date, "task created");

        Ok(task)
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task, AppError> {
        let id = require_id(id)?;
        let patch = TaskPatch {
            title: patch.title.as_deref().map(normalize_title).transpose()?,
            date: patch.date.as_deref().map(normalize_date).transpose()?,
            habit_id: match patch.habit_id {
                Some(habit_id) => Some(normalize_habit_ref(self.state(), habit_id.as_deref())?),
                None => None,
            },
            priority: patch.priority,
            status: patch.status,
            note: patch.note.map(|note| normalize_note(note.as_deref())),
        };

        let (next, updated) = self
            .state()
            .with_task_updated(id, &patch, OffsetDateTime::now_utc())?;
        self.commit(next, Changed::TASKS)?;
        tracing::debug!(task_id = %updated.id, "task updated");

        Ok(updated)
    }

    pub fn toggle_task(&mut self, id: &str) -> Result<Task, AppError> {
        let id = require_id(id)?;
        let (next, toggled) = self.state().with_task_toggled(id, OffsetDateTime::now_utc())?;
        self.commit(next, Changed::TASKS)?;
        tracing::debug!(task_id = %toggled.id, status = %toggled.status, "task toggled");

        Ok(toggled)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, AppError> {
        let id = require_id(id)?;
        let (next, removed) = self.state().with_task_deleted(id)?;
        self.commit(next, Changed::TASKS)?;
        tracing::debug!(task_id = %removed.id, "task deleted");

        Ok(removed)
    }
}

fn require_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

fn normalize_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }
    Ok(trimmed.to_string())
}

fn normalize_date(date: &str) -> Result<String, AppError> {
    parse_day(date)
        .map(format_day)
        .ok_or_else(|| AppError::invalid_input("date must be YYYY-MM-DD"))
}

fn normalize_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string)
}

fn normalize_habit_ref(state: &AppState, habit_id: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(habit_id) = habit_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(None);
    };

    if state.habit(habit_id).is_none() {
        return Err(AppError::not_found(format!("habit {habit_id} not found")));
    }
    Ok(Some(habit_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{TaskDraft, TaskPatch};
    use crate::habit_api::HabitDraft;
    use crate::model::{Priority, TaskStatus};
    use crate::storage::persistence::{self, TASKS_KEY};
    use crate::storage::{FileStore, KeyValueStore, MemoryStore};
    use crate::workspace::Workspace;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::date;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("habitos-{nanos}-{name}"))
    }

    fn workspace() -> Workspace<MemoryStore> {
        Workspace::open(MemoryStore::new()).unwrap()
    }

    #[test]
    fn create_task_rejects_blank_title() {
        let mut workspace = workspace();
        let err = workspace
            .create_task(TaskDraft::new("  ", date!(2025 - 12 - 20)))
            .unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert!(workspace.list_tasks().is_empty());
    }

    #[test]
    fn create_task_rejects_malformed_date() {
        let mut workspace = workspace();
        let draft = TaskDraft {
            title: "demo".to_string(),
            date: "20-12-2025".to_string(),
            ..TaskDraft::default()
        };

        assert_eq!(workspace.create_task(draft).unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn create_task_writes_to_store() {
        let mut workspace = workspace();
        let mut draft = TaskDraft::new(" Solve DSA problems ", date!(2025 - 12 - 20));
        draft.note = Some("   ".to_string());
        let task = workspace.create_task(draft).unwrap();

        assert_eq!(task.title, "Solve DSA problems");
        assert_eq!(task.date, "2025-12-20");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.note, None);
        assert!(task.created_at.is_some());
        assert_eq!(task.created_at, task.updated_at);

        let reloaded = persistence::load_state(workspace.store()).unwrap();
        assert_eq!(reloaded.tasks, vec![task]);
    }

    #[test]
    fn create_task_requires_existing_habit() {
        let mut workspace = workspace();
        let mut draft = TaskDraft::new("demo", date!(2025 - 12 - 20));
        draft.habit_id = Some("missing".to_string());

        assert_eq!(workspace.create_task(draft).unwrap_err().code(), "not_found");
    }

    #[test]
    fn create_task_links_habit() {
        let mut workspace = workspace();
        let habit = workspace.create_habit(HabitDraft::new("Study")).unwrap();
        let mut draft = TaskDraft::new("read chapter", date!(2025 - 12 - 20));
        draft.habit_id = Some(habit.id.clone());

        let task = workspace.create_task(draft).unwrap();
        assert_eq!(task.habit_id, Some(habit.id));
    }

    #[test]
    fn update_task_refreshes_updated_at_and_keeps_other_fields() {
        let mut workspace = workspace();
        let mut draft = TaskDraft::new("old", date!(2025 - 12 - 20));
        draft.priority = Priority::High;
        let created = workspace.create_task(draft).unwrap();

        let updated = workspace
            .update_task(
                &created.id,
                TaskPatch {
                    title: Some("new".to_string()),
                    status: Some(TaskStatus::Ongoing),
                    ..TaskPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "new");
        assert_eq!(updated.status, TaskStatus::Ongoing);
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(workspace.get_task(&created.id).unwrap(), updated);
    }

    #[test]
    fn update_task_rejects_blank_title() {
        let mut workspace = workspace();
        let created = workspace
            .create_task(TaskDraft::new("old", date!(2025 - 12 - 20)))
            .unwrap();

        let err = workspace
            .update_task(
                &created.id,
                TaskPatch {
                    title: Some(" ".to_string()),
                    ..TaskPatch::default()
                },
            )
            .unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert_eq!(workspace.get_task(&created.id).unwrap().title, "old");
    }

    #[test]
    fn update_task_can_clear_habit_link() {
        let mut workspace = workspace();
        let habit = workspace.create_habit(HabitDraft::new("Workout")).unwrap();
        let mut draft = TaskDraft::new("run", date!(2025 - 12 - 20));
        draft.habit_id = Some(habit.id);
        let created = workspace.create_task(draft).unwrap();

        let updated = workspace
            .update_task(
                &created.id,
                TaskPatch {
                    habit_id: Some(None),
                    ..TaskPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.habit_id, None);
    }

    #[test]
    fn toggle_task_round_trips_status() {
        let mut workspace = workspace();
        let created = workspace
            .create_task(TaskDraft::new("demo", date!(2025 - 12 - 20)))
            .unwrap();

        assert!(workspace.toggle_task(&created.id).unwrap().is_completed());
        assert!(!workspace.toggle_task(&created.id).unwrap().is_completed());
    }

    #[test]
    fn delete_task_removes_from_store() {
        let mut workspace = workspace();
        let created = workspace
            .create_task(TaskDraft::new("demo", date!(2025 - 12 - 20)))
            .unwrap();

        let removed = workspace.delete_task(&created.id).unwrap();

        assert_eq!(removed.id, created.id);
        assert_eq!(workspace.get_task(&created.id).unwrap_err().code(), "not_found");
        assert_eq!(workspace.store().get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn operations_reject_blank_ids() {
        let mut workspace = workspace();

        assert_eq!(workspace.toggle_task(" ").unwrap_err().code(), "invalid_input");
        assert_eq!(workspace.delete_task("").unwrap_err().code(), "invalid_input");
        assert_eq!(workspace.get_task("").unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn tasks_for_date_filters_by_day() {
        let mut workspace = workspace();
        workspace
            .create_task(TaskDraft::new("a", date!(2025 - 12 - 20)))
            .unwrap();
        workspace
            .create_task(TaskDraft::new("b", date!(2025 - 12 - 21)))
            .unwrap();
        workspace
            .create_task(TaskDraft::new("c", date!(2025 - 12 - 20)))
            .unwrap();

        let titles: Vec<String> = workspace
            .tasks_for_date(date!(2025 - 12 - 20))
            .into_iter()
            .map(|task| task.title)
            .collect();
        assert_eq!(titles, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn file_backed_workspace_survives_reopen() {
        let dir = temp_dir("task-reopen");
        let created = {
            let mut workspace = Workspace::open(FileStore::new(&dir)).unwrap();
            workspace
                .create_task(TaskDraft::new("persisted", date!(2025 - 12 - 20)))
                .unwrap()
        };

        let reopened = Workspace::open(FileStore::new(&dir)).unwrap();
        let fetched = reopened.get_task(&created.id);
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(fetched.unwrap(), created);
    }
}
