pub mod kv;
pub mod persistence;

pub use kv::{FileStore, KeyValueStore, MemoryStore};

use crate::error::AppError;
use std::path::PathBuf;

pub const DATA_DIR_ENV_VAR: &str = "HABITOS_DATA_DIR";

/// Resolves the data directory: `HABITOS_DATA_DIR`, then the configured
/// directory, then the per-user default.
pub fn data_dir(configured: Option<&str>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(DATA_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("habitos").join("data"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("habitos").join("data"))
    }
}
