use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const DEFAULT_TARGET_DAYS: i64 = 365;
pub const MAX_TARGET_DAYS: i64 = 3650;
pub const DEFAULT_COLOR: &str = "#6366f1";

/// A user-defined recurring activity, tracked through the tasks that
/// reference it.
///
/// `target_days` is signed so that a bad persisted value still loads; the
/// statistics engine treats anything outside `1..=MAX_TARGET_DAYS` as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_target_days")]
    pub target_days: i64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Habit {
    /// Rolling window length in days, if the stored target is usable.
    pub fn window_days(&self) -> Option<u32> {
        if (1..=MAX_TARGET_DAYS).contains(&self.target_days) {
            u32::try_from(self.target_days).ok()
        } else {
            None
        }
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_target_days() -> i64 {
    DEFAULT_TARGET_DAYS
}
