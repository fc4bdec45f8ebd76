use crate::error::AppError;
use crate::habit_api::HabitPatch;
use crate::model::{Habit, Task, TaskStatus, Theme};
use crate::task_api::TaskPatch;
use time::OffsetDateTime;

/// Immutable snapshot of everything the application tracks.
///
/// Transitions never modify the receiver; each returns the next snapshot.
/// Inputs are expected to be validated already (see `task_api` and
/// `habit_api`); the only failure here is an unknown id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub tasks: Vec<Task>,
    pub habits: Vec<Habit>,
    pub notes: String,
    pub theme: Theme,
}

impl AppState {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn with_task_created(&self, task: Task) -> AppState {
        let mut next = self.clone();
        next.tasks.push(task);
        next
    }

    pub fn with_task_updated(
        &self,
        id: &str,
        patch: &TaskPatch,
        now: OffsetDateTime,
    ) -> Result<(AppState, Task), AppError> {
        self.map_task(id, |task| {
            if let Some(title) = &patch.title {
                task.title = title.clone();
            }
            if let Some(date) = &patch.date {
                task.date = date.clone();
            }
            if let Some(habit_id) = &patch.habit_id {
                task.habit_id = habit_id.clone();
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            if let Some(note) = &patch.note {
                task.note = note.clone();
            }
            task.updated_at = Some(now);
        })
    }

    /// Flips a task between completed and not started.
    pub fn with_task_toggled(
        &self,
        id: &str,
        now: OffsetDateTime,
    ) -> Result<(AppState, Task), AppError> {
        self.map_task(id, |task| {
            task.status = if task.is_completed() {
                TaskStatus::NotStarted
            } else {
                TaskStatus::Completed
            };
            task.updated_at = Some(now);
        })
    }

    pub fn with_task_deleted(&self, id: &str) -> Result<(AppState, Task), AppError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;

        let mut next = self.clone();
        let removed = next.tasks.remove(index);
        Ok((next, removed))
    }

    pub fn with_habit_created(&self, habit: Habit) -> AppState {
        let mut next = self.clone();
        next.habits.push(habit);
        next
    }

    pub fn with_habit_updated(
        &self,
        id: &str,
        patch: &HabitPatch,
        now: OffsetDateTime,
    ) -> Result<(AppState, Habit), AppError> {
        let mut next = self.clone();
        let habit = next
            .habits
            .iter_mut()
            .find(|habit| habit.id == id)
            .ok_or_else(|| AppError::not_found(format!("habit {id} not found")))?;

        if let Some(name) = &patch.name {
            habit.name = name.clone();
        }
        if let Some(description) = &patch.description {
            habit.description = description.clone();
        }
        if let Some(color) = &patch.color {
            habit.color = color.clone();
        }
        if let Some(target_days) = patch.target_days {
            habit.target_days = target_days;
        }
        habit.updated_at = Some(now);

        let updated = habit.clone();
        Ok((next, updated))
    }

    /// Removes a habit and unlinks every task that referenced it. Tasks are
    /// never deleted along with their habit.
    pub fn with_habit_deleted(
        &self,
        id: &str,
        now: OffsetDateTime,
    ) -> Result<(AppState, Habit), AppError> {
        let index = self
            .habits
            .iter()
            .position(|habit| habit.id == id)
            .ok_or_else(|| AppError::not_found(format!("habit {id} not found")))?;

        let mut next = self.clone();
        let removed = next.habits.remove(index);
        for task in next.tasks.iter_mut().filter(|task| task.belongs_to(id)) {
            task.habit_id = None;
            task.updated_at = Some(now);
        }

        Ok((next, removed))
    }

    pub fn with_notes(&self, notes: &str) -> AppState {
        AppState {
            notes: notes.to_string(),
            ..self.clone()
        }
    }

    pub fn with_theme(&self, theme: Theme) -> AppState {
        AppState {
            theme,
            ..self.clone()
        }
    }

    fn map_task<F>(&self, id: &str, apply: F) -> Result<(AppState, Task), AppError>
    where
        F: FnOnce(&mut Task),
    {
        let mut next = self.clone();
        let task = next
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;

        apply(task);
        let updated = task.clone();
        Ok((next, updated))
    }
}
