use crate::error::AppError;
use crate::habit_api::validate_target_days;
use crate::heatmap::{DEFAULT_WEEKS, MAX_WEEKS};
use crate::model::{DEFAULT_TARGET_DAYS, Theme};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "HABITOS_CONFIG_PATH";

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        if self.accent.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.accent, text, self.reset)
        }
    }

    pub fn mutedize(&self, text: &str) -> String {
        if self.muted.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.muted, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            accent: "\x1b[38;5;141m",
            muted: "\x1b[38;5;245m",
            reset: "\x1b[0m",
        },
        Theme::Light => Palette {
            accent: "\x1b[38;5;61m",
            muted: "\x1b[38;5;240m",
            reset: "\x1b[0m",
        },
    }
}

/// A palette that emits no escape codes, for piped output.
pub fn plain_palette() -> Palette {
    Palette {
        accent: "",
        muted: "",
        reset: "",
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub default_target_days: Option<i64>,
    #[serde(default)]
    pub heatmap_weeks: Option<usize>,
}

impl Config {
    pub fn default_target_days(&self) -> i64 {
        self.default_target_days.unwrap_or(DEFAULT_TARGET_DAYS)
    }

    pub fn heatmap_weeks(&self) -> usize {
        self.heatmap_weeks.unwrap_or(DEFAULT_WEEKS)
    }

    fn validate(self) -> Result<Self, AppError> {
        if let Some(days) = self.default_target_days {
            validate_target_days(days).map_err(|err| {
                AppError::invalid_data(format!("default_target_days: {}", err.message()))
            })?;
        }
        if let Some(weeks) = self.heatmap_weeks
            && !(1..=MAX_WEEKS).contains(&weeks)
        {
            return Err(AppError::invalid_data(format!(
                "heatmap_weeks must be between 1 and {MAX_WEEKS}"
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub data_dir: Option<String>,
    pub default_target_days: Option<i64>,
    pub heatmap_weeks: Option<usize>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("habitos")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("habitos")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config() -> Result<Config, AppError> {
    let path = config_path()?;
    load_config_from_path(&path)
}

/// Loads the config file, falling back to defaults. A missing file is not an
/// error; an unreadable or invalid one is reported alongside the defaults.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.validate()
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(data_dir) = overrides.data_dir.as_ref() {
        merged.data_dir = Some(data_dir.clone());
    }
    if let Some(days) = overrides.default_target_days {
        merged.default_target_days = Some(days);
    }
    if let Some(weeks) = overrides.heatmap_weeks {
        merged.heatmap_weeks = Some(weeks);
    }
    merged
}
