use clap::{Parser, Subcommand};
use habitos_core::config::ConfigOverrides;
use habitos_core::error::AppError;
use habitos_core::habit_api::validate_target_days;
use habitos_core::heatmap::MAX_WEEKS;

#[derive(Parser, Debug)]
#[command(name = "habitos", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Reference date for "today" (defaults to the local calendar date)
    #[arg(long, value_name = "YYYY-MM-DD", global = true)]
    pub today: Option<String>,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage dated tasks
    Task {
        #[command(subcommand)]
        task: TaskCommand,
    },
    /// Manage habits and show their statistics
    Habit {
        #[command(subcommand)]
        habit: HabitCommand,
    },
    /// Read or replace the free-form notes
    Notes {
        #[command(subcommand)]
        notes: NotesCommand,
    },
    /// Read or change the colour theme
    Theme {
        #[command(subcommand)]
        theme: ThemeCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task
    ///
    /// Example: habitos task add "Read 20 pages" --habit <HABIT_ID> --priority high
    Add {
        title: Option<String>,
        /// Day the task belongs to (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
        /// Habit id to link the task to
        #[arg(long, value_name = "HABIT_ID")]
        habit: Option<String>,
        /// low, medium or high
        #[arg(long)]
        priority: Option<String>,
        /// not-started, ongoing or completed
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Change fields of a task
    ///
    /// Example: habitos task edit <ID> --status ongoing --no-habit
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
        #[arg(long, value_name = "HABIT_ID", conflicts_with = "no_habit")]
        habit: Option<String>,
        /// Unlink the task from its habit
        #[arg(long)]
        no_habit: bool,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, conflicts_with = "clear_note")]
        note: Option<String>,
        #[arg(long)]
        clear_note: bool,
    },
    /// Flip a task between completed and not-started
    ///
    /// Example: habitos task toggle <ID>
    Toggle { id: String },
    /// Delete a task
    ///
    /// Example: habitos task delete <ID>
    Delete { id: String },
    /// Show details of a task
    Show { id: String },
    /// List the tasks of a day, grouped by status
    ///
    /// --priority and --status narrow the grouped listing only. The
    /// completed/total line at the top always counts every task of the day.
    ///
    /// Example: habitos task list --date 2025-12-20 --priority high
    List {
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
        #[arg(long, conflicts_with = "status")]
        priority: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Show the Monday-to-Sunday week with a completed/total count per day
    ///
    /// Example: habitos task week --date 2025-12-20 --shift -1
    Week {
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
        /// Move by whole weeks, negative for earlier weeks
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        shift: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum HabitCommand {
    /// Add a habit
    ///
    /// Example: habitos habit add "Workout" --color "#22c55e" --target-days 30
    Add {
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Hex colour, #rgb or #rrggbb
        #[arg(long)]
        color: Option<String>,
        /// Length of the rolling statistics window in days
        #[arg(long, value_name = "N")]
        target_days: Option<i64>,
    },
    /// Change fields of a habit
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, value_name = "N")]
        target_days: Option<i64>,
    },
    /// Delete a habit; its tasks are kept and unlinked
    Delete { id: String },
    /// List habits with streak, completion rate and today's progress
    ///
    /// Example: habitos habit list --filter active
    List {
        /// all, active or completed
        #[arg(long, default_value = "all")]
        filter: String,
    },
    /// Show a habit's statistics and heatmap
    Show {
        id: String,
        /// Number of heatmap columns
        #[arg(long, value_name = "N")]
        weeks: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotesCommand {
    /// Print the notes
    Show,
    /// Replace the notes
    ///
    /// Example: habitos notes set "Buy running shoes"
    Set { text: String },
}

#[derive(Subcommand, Debug)]
pub enum ThemeCommand {
    /// Print the current theme
    Show,
    /// Switch theme (dark or light)
    Set { theme: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    DataDir,
    DefaultTargetDays,
    HeatmapWeeks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let canonical_field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "data_dir" => ConfigOverrideTarget::DataDir,
        "default_target_days" => ConfigOverrideTarget::DefaultTargetDays,
        "heatmap_weeks" => ConfigOverrideTarget::HeatmapWeeks,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("override for '{canonical_field}' needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` argument into one set of overrides.
/// Later arguments win over earlier ones.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::DataDir => overrides.data_dir = Some(parsed.value),
            ConfigOverrideTarget::DefaultTargetDays => {
                let days = parsed.value.parse::<i64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "default_target_days must be an integer, got '{}'",
                        parsed.value
                    ))
                })?;
                overrides.default_target_days = Some(validate_target_days(days)?);
            }
            ConfigOverrideTarget::HeatmapWeeks => {
                let weeks = parsed
                    .value
                    .parse::<usize>()
                    .ok()
                    .filter(|weeks| (1..=MAX_WEEKS).contains(weeks))
                    .ok_or_else(|| {
                        AppError::invalid_input(format!(
                            "heatmap_weeks must be between 1 and {MAX_WEEKS}"
                        ))
                    })?;
                overrides.heatmap_weeks = Some(weeks);
            }
        }
    }

    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
