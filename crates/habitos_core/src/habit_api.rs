use crate::error::AppError;
use crate::model::{DEFAULT_COLOR, Habit, MAX_TARGET_DAYS};
use crate::storage::KeyValueStore;
use crate::workspace::{Changed, Workspace};
use time::OffsetDateTime;
use uuid::Uuid;

/// Input for a new habit. Unset `color` and `target_days` take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitDraft {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub target_days: Option<i64>,
}

impl HabitDraft {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub target_days: Option<i64>,
}

impl<S: KeyValueStore> Workspace<S> {
    pub fn list_habits(&self) -> &[Habit] {
        &self.state().habits
    }

    pub fn get_habit(&self, id: &str) -> Result<Habit, AppError> {
        let id = require_id(id)?;
        self.state()
            .habit(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("habit {id} not found")))
    }

    pub fn create_habit(&mut self, draft: HabitDraft) -> Result<Habit, AppError> {
        let name = normalize_name(&draft.name)?;
        let color = match draft.color.as_deref() {
            Some(color) => normalize_color(color)?,
            None => DEFAULT_COLOR.to_string(),
        };
        let target_days =
            validate_target_days(draft.target_days.unwrap_or(self.default_target_days()))?;
        let now = OffsetDateTime::now_utc();

        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            name,
            description: normalize_description(draft.description.as_deref()),
            color,
            target_days,
            created_at: Some(now),
            updated_at: Some(now),
        };

        let next = self.state().with_habit_created(habit.clone());
        self.commit(next, Changed::HABITS)?;
        tracing::debug!(habit_id = %habit.id, target_days, "habit created");

        Ok(habit)
    }

    pub fn update_habit(&mut self, id: &str, patch: HabitPatch) -> Result<Habit, AppError> {
        let id = require_id(id)?;
        let patch = HabitPatch {
            name: patch.name.as_deref().map(normalize_name).transpose()?,
            description: patch
                .description
                .map(|description| normalize_description(description.as_deref())),
            color: patch.color.as_deref().map(normalize_color).transpose()?,
            target_days: patch.target_days.map(validate_target_days).transpose()?,
        };

        let (next, updated) = self
            .state()
            .with_habit_updated(id, &patch, OffsetDateTime::now_utc())?;
        self.commit(next, Changed::HABITS)?;
        tracing::debug!(habit_id = %updated.id, "habit updated");

        Ok(updated)
    }

    /// Deletes a habit. Tasks that referenced it stay, with `habit_id`
    /// cleared.
    pub fn delete_habit(&mut self, id: &str) -> Result<Habit, AppError> {
        let id = require_id(id)?;
        let (next, removed) = self
            .state()
            .with_habit_deleted(id, OffsetDateTime::now_utc())?;
        let unlinked = self
            .state()
            .tasks
            .iter()
            .filter(|task| task.belongs_to(id))
            .count();

        let changed = if unlinked > 0 {
            Changed::TASKS_AND_HABITS
        } else {
            Changed::HABITS
        };
        self.commit(next, changed)?;
        tracing::debug!(habit_id = %removed.id, unlinked, "habit deleted");

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

fn normalize_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|description| !description.is_empty())
        .map(str::to_string)
}

/// Accepts `#rgb` or `#rrggbb`, returned lowercased.
pub fn normalize_color(color: &str) -> Result<String, AppError> {
    let trimmed = color.trim();
    let valid = trimmed
        .strip_prefix('#')
        .filter(|hex| hex.len() == 3 || hex.len() == 6)
        .is_some_and(|hex| hex.chars().all(|ch| ch.is_ascii_hexdigit()));

    if !valid {
        return Err(AppError::invalid_input("color must be #rgb or #rrggbb"));
    }
    Ok(trimmed.to_ascii_lowercase())
}

pub fn validate_target_days(days: i64) -> Result<i64, AppError> {
    if !(1..=MAX_TARGET_DAYS).contains(&days) {
        return Err(AppError::invalid_input(format!(
            "target days must be between 1 and {MAX_TARGET_DAYS}"
        )));
    }
    Ok(days)
}
