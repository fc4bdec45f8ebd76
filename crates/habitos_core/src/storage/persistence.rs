use super::kv::KeyValueStore;
use crate::error::AppError;
use crate::model::{Habit, Task, Theme};
use crate::state::AppState;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const TASKS_KEY: &str = "tasks";
pub const HABITS_KEY: &str = "habits";
pub const NOTES_KEY: &str = "notes";
pub const THEME_KEY: &str = "theme";

/// Rehydrates the full application state.
///
/// Content problems never fail the load: an absent key yields the empty
/// default, an unparseable value yields the empty default, and a single
/// malformed record inside a collection is skipped. Only failures of the
/// store itself are returned.
pub fn load_state<S: KeyValueStore + ?Sized>(store: &S) -> Result<AppState, AppError> {
    Ok(AppState {
        tasks: load_collection::<Task, S>(store, TASKS_KEY)?,
        habits: load_collection::<Habit, S>(store, HABITS_KEY)?,
        notes: load_notes(store)?,
        theme: load_theme(store)?,
    })
}

pub fn save_state<S: KeyValueStore + ?Sized>(
    store: &mut S,
    state: &AppState,
) -> Result<(), AppError> {
    save_tasks(store, &state.tasks)?;
    save_habits(store, &state.habits)?;
    save_notes(store, &state.notes)?;
    save_theme(store, state.theme)
}

pub fn save_tasks<S: KeyValueStore + ?Sized>(store: &mut S, tasks: &[Task]) -> Result<(), AppError> {
    save_json(store, TASKS_KEY, &tasks)
}

pub fn save_habits<S: KeyValueStore + ?Sized>(
    store: &mut S,
    habits: &[Habit],
) -> Result<(), AppError> {
    save_json(store, HABITS_KEY, &habits)
}

pub fn save_notes<S: KeyValueStore + ?Sized>(store: &mut S, notes: &str) -> Result<(), AppError> {
    save_json(store, NOTES_KEY, &notes)
}

pub fn save_theme<S: KeyValueStore + ?Sized>(store: &mut S, theme: Theme) -> Result<(), AppError> {
    store.set(THEME_KEY, theme.as_str())
}

fn save_json<S: KeyValueStore + ?Sized, T: Serialize + ?Sized>(
    store: &mut S,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let content =
        serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))?;
    store.set(key, &content)
}

fn load_collection<T: DeserializeOwned, S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Vec<T>, AppError> {
    let Some(content) = store.get(key)? else {
        return Ok(Vec::new());
    };

    let raw: Vec<serde_json::Value> = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable collection");
            return Ok(Vec::new());
        }
    };

    let mut items = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(item) => items.push(item),
            Err(err) => tracing::warn!(key, index, error = %err, "skipping malformed record"),
        }
    }

    Ok(items)
}

fn load_notes<S: KeyValueStore + ?Sized>(store: &S) -> Result<String, AppError> {
    let Some(content) = store.get(NOTES_KEY)? else {
        return Ok(String::new());
    };

    match serde_json::from_str::<String>(&content) {
        Ok(notes) => Ok(notes),
        Err(err) => {
            tracing::warn!(key = NOTES_KEY, error = %err, "discarding unreadable notes");
            Ok(String::new())
        }
    }
}

fn load_theme<S: KeyValueStore + ?Sized>(store: &S) -> Result<Theme, AppError> {
    let Some(content) = store.get(THEME_KEY)? else {
        return Ok(Theme::default());
    };

    match content.trim().trim_matches('"').parse::<Theme>() {
        Ok(theme) => Ok(theme),
        Err(err) => {
            tracing::warn!(key = THEME_KEY, error = %err, "ignoring unknown theme");
            Ok(Theme::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        HABITS_KEY, NOTES_KEY, TASKS_KEY, THEME_KEY, load_state, save_notes, save_state,
        save_tasks,
    };
    use crate::model::{Habit, Priority, Task, TaskStatus, Theme};
    use crate::state::AppState;
    use crate::storage::kv::{FileStore, KeyValueStore, MemoryStore};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::datetime;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("habitos-{nanos}-{name}"))
    }

    fn sample_state() -> AppState {
        AppState {
            tasks: vec![
                Task {
                    id: "t1".to_string(),
                    title: "Solve DSA problems".to_string(),
                    date: "2025-12-20".to_string(),
                    habit_id: Some("h1".to_string()),
                    priority: Priority::High,
                    status: TaskStatus::Completed,
                    note: Some("Focus on graphs".to_string()),
                    created_at: Some(datetime!(2025-12-20 08:00:00.123 UTC)),
                    updated_at: Some(datetime!(2025-12-20 09:15:00 UTC)),
                },
                Task {
                    id: "t2".to_string(),
                    title: "Groceries".to_string(),
                    date: "2025-12-21".to_string(),
                    habit_id: None,
                    priority: Priority::Low,
                    status: TaskStatus::NotStarted,
                    note: None,
                    created_at: None,
                    updated_at: None,
                },
            ],
            habits: vec![Habit {
                id: "h1".to_string(),
                name: "Study".to_string(),
                description: Some("Daily practice".to_string()),
                color: "#6366f1".to_string(),
                target_days: 90,
                created_at: Some(datetime!(2025-12-01 00:00:00 UTC)),
                updated_at: None,
            }],
            notes: "remember the \"milk\"\nand eggs".to_string(),
            theme: Theme::Light,
        }
    }

    #[test]
    fn empty_store_loads_defaults() {
        let store = MemoryStore::new();
        let state = load_state(&store).unwrap();

        assert_eq!(state, AppState::default());
        assert_eq!(state.theme, Theme::Dark);
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut store = MemoryStore::new();
        let state = sample_state();

        save_state(&mut store, &state).unwrap();
        let loaded = load_state(&store).unwrap();

        assert_eq!(loaded, state);
        assert_eq!(loaded.tasks[1].habit_id, None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = temp_dir("persist-round-trip");
        let mut store = FileStore::new(&dir);
        let state = sample_state();

        save_state(&mut store, &state).unwrap();
        let loaded = load_state(&FileStore::new(&dir)).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, state);
    }

    #[test]
    fn theme_is_stored_as_bare_string() {
        let mut store = MemoryStore::new();
        save_state(&mut store, &sample_state()).unwrap();

        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn corrupt_entries_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set(TASKS_KEY, "{ not json").unwrap();
        store.set(HABITS_KEY, "{\"id\":\"h1\"}").unwrap();
        store.set(NOTES_KEY, "[1, 2]").unwrap();
        store.set(THEME_KEY, "sepia").unwrap();

        let state = load_state(&store).unwrap();

        assert!(state.tasks.is_empty());
        assert!(state.habits.is_empty());
        assert_eq!(state.notes, "");
        assert_eq!(state.theme, Theme::Dark);
    }

    #[test]
    fn malformed_records_are_skipped_individually() {
        let mut store = MemoryStore::new();
        let content = r#"[
            {"id":"t1","title":"ok","date":"2025-12-20","completed":true},
            {"id":"t2","date":"2025-12-20"},
            {"id":"t3","title":"bad date kept","date":"soon"}
        ]"#;
        store.set(TASKS_KEY, content).unwrap();

        let state = load_state(&store).unwrap();

        assert_eq!(state.tasks.len(), 2);
        assert_eq!(state.tasks[0].id, "t1");
        assert!(state.tasks[0].is_completed());
        assert_eq!(state.tasks[1].date, "soon");
    }

    #[test]
    fn legacy_habits_get_default_target_at_load() {
        let mut store = MemoryStore::new();
        store
            .set(HABITS_KEY, r##"[{"id":"h1","name":"Study","color":"#6366f1"}]"##)
            .unwrap();

        let state = load_state(&store).unwrap();
        assert_eq!(state.habits[0].target_days, 365);
    }

    #[test]
    fn quoted_theme_value_is_accepted() {
        let mut store = MemoryStore::new();
        store.set(THEME_KEY, "\"light\"").unwrap();

        assert_eq!(load_state(&store).unwrap().theme, Theme::Light);
    }

    #[test]
    fn partial_saves_only_touch_their_key() {
        let mut store = MemoryStore::new();
        save_notes(&mut store, "scratch").unwrap();
        save_tasks(&mut store, &[]).unwrap();

        assert_eq!(store.get(NOTES_KEY).unwrap().as_deref(), Some("\"scratch\""));
        assert_eq!(store.get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get(HABITS_KEY).unwrap(), None);
    }
}
