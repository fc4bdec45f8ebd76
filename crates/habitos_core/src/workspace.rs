use crate::error::AppError;
use crate::model::{DEFAULT_TARGET_DAYS, Theme};
use crate::state::AppState;
use crate::storage::KeyValueStore;
use crate::storage::persistence;

/// Which persisted keys a transition touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Changed {
    pub tasks: bool,
    pub habits: bool,
    pub notes: bool,
    pub theme: bool,
}

impl Changed {
    pub const TASKS: Changed = Changed {
        tasks: true,
        habits: false,
        notes: false,
        theme: false,
    };
    pub const HABITS: Changed = Changed {
        tasks: false,
        habits: true,
        notes: false,
        theme: false,
    };
    pub const TASKS_AND_HABITS: Changed = Changed {
        tasks: true,
        habits: true,
        notes: false,
        theme: false,
    };
    pub const NOTES: Changed = Changed {
        tasks: false,
        habits: false,
        notes: true,
        theme: false,
    };
    pub const THEME: Changed = Changed {
        tasks: false,
        habits: false,
        notes: false,
        theme: true,
    };
}

/// The composition root's state container: owns the key-value store and the
/// current [`AppState`] snapshot.
///
/// Every operation validates its input, builds the next snapshot, writes the
/// affected keys, and only then makes the new snapshot current. A failed
/// write leaves the previous snapshot in place.
#[derive(Debug)]
pub struct Workspace<S: KeyValueStore> {
    store: S,
    state: AppState,
    default_target_days: i64,
}

impl<S: KeyValueStore> Workspace<S> {
    pub fn open(store: S) -> Result<Self, AppError> {
        let state = persistence::load_state(&store)?;
        tracing::debug!(
            tasks = state.tasks.len(),
            habits = state.habits.len(),
            "workspace loaded"
        );
        Ok(Self {
            store,
            state,
            default_target_days: DEFAULT_TARGET_DAYS,
        })
    }

    /// Target used by `create_habit` when the draft leaves it unset.
    pub fn with_default_target_days(mut self, days: i64) -> Self {
        self.default_target_days = days;
        self
    }

    pub fn default_target_days(&self) -> i64 {
        self.default_target_days
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn notes(&self) -> &str {
        &self.state.notes
    }

    pub fn set_notes(&mut self, notes: &str) -> Result<(), AppError> {
        let next = self.state.with_notes(notes);
        self.commit(next, Changed::NOTES)?;
        tracing::debug!(len = notes.len(), "notes updated");
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), AppError> {
        let next = self.state.with_theme(theme);
        self.commit(next, Changed::THEME)?;
        tracing::debug!(%theme, "theme updated");
        Ok(())
    }

    /// Persists the keys in `changed`, then makes `next` current. If any
    /// write fails, keys already written are restored from the current
    /// snapshot so the store matches what stays in memory.
    pub(crate) fn commit(&mut self, next: AppState, changed: Changed) -> Result<(), AppError> {
        let mut written = Changed::default();
        if let Err(err) = write_keys(&mut self.store, &next, changed, &mut written) {
            let mut restored = Changed::default();
            if let Err(rollback) = write_keys(&mut self.store, &self.state, written, &mut restored)
            {
                tracing::warn!(error = %rollback, "could not restore keys after failed write");
            }
            return Err(err);
        }
        self.state = next;
        Ok(())
    }
}

fn write_keys<S: KeyValueStore>(
    store: &mut S,
    state: &AppState,
    changed: Changed,
    written: &mut Changed,
) -> Result<(), AppError> {
    if changed.tasks {
        persistence::save_tasks(store, &state.tasks)?;
        written.tasks = true;
    }
    if changed.habits {
        persistence::save_habits(store, &state.habits)?;
        written.habits = true;
    }
    if changed.notes {
        persistence::save_notes(store, &state.notes)?;
        written.notes = true;
    }
    if changed.theme {
        persistence::save_theme(store, state.theme)?;
        written.theme = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Workspace;
    use crate::error::AppError;
    use crate::habit_api::HabitDraft;
    use crate::model::Theme;
    use crate::storage::persistence::{self, HABITS_KEY, NOTES_KEY, THEME_KEY};
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::task_api::TaskDraft;
    use time::macros::date;

    /// Rejects writes to `fail_on`, or to every key when unset.
    #[derive(Debug, Default)]
    struct FailingStore {
        inner: MemoryStore,
        fail_on: Option<&'static str>,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
            if self.fail_on.is_none_or(|failing| failing == key) {
                return Err(AppError::io("disk full"));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), AppError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn notes_are_persisted_immediately() {
        let mut workspace = Workspace::open(MemoryStore::new()).unwrap();
        workspace.set_notes("call mum").unwrap();

        assert_eq!(workspace.notes(), "call mum");
        assert_eq!(
            workspace.store().get(NOTES_KEY).unwrap().as_deref(),
            Some("\"call mum\"")
        );
    }

    #[test]
    fn theme_round_trips_through_reopen() {
        let mut workspace = Workspace::open(MemoryStore::new()).unwrap();
        assert_eq!(workspace.theme(), Theme::Dark);
        workspace.set_theme(Theme::Light).unwrap();

        let store = workspace.into_store();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
        let reopened = Workspace::open(store).unwrap();
        assert_eq!(reopened.theme(), Theme::Light);
    }

    #[test]
    fn failed_write_keeps_previous_snapshot() {
        let mut workspace = Workspace::open(FailingStore::default()).unwrap();
        let err = workspace.set_notes("lost").unwrap_err();

        assert_eq!(err.code(), "io_error");
        assert_eq!(workspace.notes(), "");
    }

    #[test]
    fn failed_second_write_restores_first_key() {
        let mut seeded = Workspace::open(MemoryStore::new()).unwrap();
        let habit = seeded.create_habit(HabitDraft::new("Workout")).unwrap();
        let mut draft = TaskDraft::new("run 5k", date!(2025 - 12 - 20));
        draft.habit_id = Some(habit.id.clone());
        let task = seeded.create_task(draft).unwrap();

        let store = FailingStore {
            inner: seeded.into_store(),
            fail_on: Some(HABITS_KEY),
        };
        let mut workspace = Workspace::open(store).unwrap();
        let err = workspace.delete_habit(&habit.id).unwrap_err();

        assert_eq!(err.code(), "io_error");
        assert_eq!(workspace.list_habits().len(), 1);
        assert_eq!(
            workspace.get_task(&task.id).unwrap().habit_id.as_deref(),
            Some(habit.id.as_str())
        );

        let on_disk = persistence::load_state(workspace.store()).unwrap();
        assert_eq!(&on_disk, workspace.state());
    }
}
