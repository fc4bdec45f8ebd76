//! Habit and task tracking core: data model, key-value persistence, an
//! immutable state container, and the habit statistics engine.

pub mod config;
pub mod error;
pub mod filters;
pub mod habit_api;
pub mod heatmap;
pub mod model;
pub mod state;
pub mod stats;
pub mod storage;
pub mod task_api;
pub mod workspace;

pub use error::{AppError, AppResult};
pub use workspace::Workspace;
