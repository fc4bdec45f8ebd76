//! Plain, table and JSON renderings of core values.
//!
//! Everything returns a `String` or a `serde_json::Value`; printing is left
//! to the binary so the output can be tested without a process.

use habitos_core::config::Palette;
use habitos_core::error::AppError;
use habitos_core::filters::{DayStats, StatusGroups, WeekDay};
use habitos_core::heatmap::HeatmapWeek;
use habitos_core::model::{Habit, Task, TaskStatus, format_day};
use habitos_core::stats::{HabitStats, Overview};
use serde_json::{Value, json};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::Date;

const CELL_DONE: &str = "■";
const CELL_TOUCHED: &str = "□";
const CELL_EMPTY: &str = "·";

pub fn task_json(task: &Task) -> Result<Value, AppError> {
    serde_json::to_value(task).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn habit_json(habit: &Habit) -> Result<Value, AppError> {
    serde_json::to_value(habit).map_err(|err| AppError::invalid_data(err.to_string()))
}

fn tasks_json(tasks: &[&Task]) -> Result<Value, AppError> {
    tasks
        .iter()
        .map(|task| task_json(task))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

pub fn task_line(task: &Task) -> String {
    let habit = task.habit_id.as_deref().unwrap_or("-");
    format!(
        "{} | {} | {} | {} | {} | {}",
        task.id, task.title, task.date, task.priority, task.status, habit
    )
}

pub fn task_details(task: &Task, habit_name: Option<&str>) -> String {
    let habit = match (task.habit_id.as_deref(), habit_name) {
        (Some(id), Some(name)) => format!("{name} ({id})"),
        (Some(id), None) => id.to_string(),
        (None, _) => "-".to_string(),
    };
    [
        format!("ID: {}", task.id),
        format!("Title: {}", task.title),
        format!("Date: {}", task.date),
        format!("Priority: {}", task.priority),
        format!("Status: {}", task.status),
        format!("Habit: {habit}"),
        format!("Note: {}", task.note.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

/// The right-bar board: day stats, then one section per status column.
pub fn task_board(
    date: Date,
    groups: &StatusGroups<'_>,
    stats: &DayStats,
    palette: &Palette,
) -> String {
    let mut lines = vec![format!(
        "Tasks for {}: {}/{} completed ({}%)",
        format_day(date),
        stats.completed,
        stats.total,
        stats.completion_rate
    )];

    for status in TaskStatus::ALL {
        let tasks = groups.get(status);
        lines.push(palette.accentize(&format!("{} ({})", status, tasks.len())));
        if tasks.is_empty() {
            lines.push(format!("  {}", palette.mutedize("-")));
        }
        for task in tasks {
            lines.push(format!("  {}", task_line(task)));
        }
    }

    lines.join("\n")
}

pub fn task_board_json(
    date: Date,
    groups: &StatusGroups<'_>,
    stats: &DayStats,
) -> Result<Value, AppError> {
    let mut by_status = serde_json::Map::new();
    for status in TaskStatus::ALL {
        by_status.insert(status.as_str().to_string(), tasks_json(groups.get(status))?);
    }

    Ok(json!({
        "date": format_day(date),
        "stats": {
            "total": stats.total,
            "completed": stats.completed,
            "completionRate": stats.completion_rate,
        },
        "groups": Value::Object(by_status),
    }))
}

fn weekday_label(date: Date) -> String {
    date.weekday().to_string().chars().take(3).collect()
}

/// One line per day, Monday first. Days without tasks show `-`; fully
/// completed days are accented and marked `done`.
pub fn week_view(week: &[WeekDay; 7], selected: Date, today: Date, palette: &Palette) -> String {
    let mut lines = vec![format!("Week of {}", format_day(week[0].date))];

    for day in week {
        let marker = if day.date == selected { ">" } else { " " };
        let counter = if day.stats.total == 0 {
            palette.mutedize("-")
        } else if day.all_done() {
            palette.accentize(&format!("{}/{} done", day.stats.completed, day.stats.total))
        } else {
            format!("{}/{}", day.stats.completed, day.stats.total)
        };
        let suffix = if day.date == today { " (today)" } else { "" };
        lines.push(format!(
            "{marker} {} {}  {counter}{suffix}",
            weekday_label(day.date),
            format_day(day.date)
        ));
    }

    lines.join("\n")
}

pub fn week_json(selected: Date, week: &[WeekDay; 7]) -> Value {
    let days: Vec<Value> = week
        .iter()
        .map(|day| {
            json!({
                "date": format_day(day.date),
                "weekday": weekday_label(day.date),
                "total": day.stats.total,
                "completed": day.stats.completed,
                "completionRate": day.stats.completion_rate,
                "allDone": day.all_done(),
            })
        })
        .collect();

    json!({
        "selected": format_day(selected),
        "weekStart": format_day(week[0].date),
        "days": days,
    })
}

#[derive(Tabled)]
struct HabitRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Habit")]
    name: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Streak")]
    streak: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Today")]
    today: String,
}

fn streak_label(stats: &HabitStats) -> String {
    if stats.streak_truncated {
        format!("{}+", stats.streak)
    } else {
        stats.streak.to_string()
    }
}

pub fn habit_table(rows: &[(&Habit, &HabitStats)]) -> String {
    let rows: Vec<HabitRow> = rows
        .iter()
        .map(|(habit, stats)| HabitRow {
            id: habit.id.clone(),
            name: habit.name.clone(),
            target: format!("{}d", habit.target_days),
            streak: streak_label(stats),
            rate: format!(
                "{}% ({}/{})",
                stats.completion_rate, stats.completed_days, habit.target_days
            ),
            today: format!(
                "{}/{} ({}%)",
                stats.completed_today, stats.total_today, stats.progress
            ),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

pub fn overview_line(overview: &Overview) -> String {
    format!(
        "{}/{} habits completed today ({}%)",
        overview.habits_completed_today, overview.total_habits, overview.completion_rate
    )
}

pub fn overview_json(overview: &Overview) -> Value {
    json!({
        "totalHabits": overview.total_habits,
        "habitsCompletedToday": overview.habits_completed_today,
        "completionRate": overview.completion_rate,
    })
}

pub fn stats_json(stats: &HabitStats) -> Result<Value, AppError> {
    let today_tasks: Vec<&Task> = stats.today_tasks.iter().collect();
    Ok(json!({
        "habitId": stats.habit_id,
        "today": format_day(stats.today),
        "completedDays": stats.completed_days,
        "completionRate": stats.completion_rate,
        "streak": stats.streak,
        "streakTruncated": stats.streak_truncated,
        "completedToday": stats.completed_today,
        "totalToday": stats.total_today,
        "progress": stats.progress,
        "totalTasks": stats.total_tasks,
        "completedTasks": stats.completed_tasks,
        "todayTasks": tasks_json(&today_tasks)?,
    }))
}

pub fn habit_details(habit: &Habit, stats: &HabitStats) -> String {
    [
        format!("ID: {}", habit.id),
        format!("Name: {}", habit.name),
        format!("Description: {}", habit.description.as_deref().unwrap_or("-")),
        format!("Color: {}", habit.color),
        format!("Target: {} days", habit.target_days),
        format!(
            "Completion: {}% ({}/{} days)",
            stats.completion_rate, stats.completed_days, habit.target_days
        ),
        format!("Streak: {} days", streak_label(stats)),
        format!(
            "Today: {}/{} ({}%)",
            stats.completed_today, stats.total_today, stats.progress
        ),
        format!(
            "All time: {}/{} tasks completed",
            stats.completed_tasks, stats.total_tasks
        ),
    ]
    .join("\n")
}

/// Seven text rows, one per position in the week; columns run oldest to
/// newest so today is the bottom-right cell.
pub fn heatmap_grid(grid: &[HeatmapWeek], palette: &Palette) -> String {
    (0..7)
        .map(|row| {
            grid.iter()
                .map(|week| {
                    let cell = &week[row];
                    if cell.completed {
                        palette.accentize(CELL_DONE)
                    } else if cell.task_count > 0 {
                        palette.mutedize(CELL_TOUCHED)
                    } else {
                        palette.mutedize(CELL_EMPTY)
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn heatmap_json(grid: &[HeatmapWeek]) -> Value {
    Value::Array(
        grid.iter()
            .map(|week| {
                Value::Array(
                    week.iter()
                        .map(|cell| {
                            json!({
                                "date": format_day(cell.date),
                                "completed": cell.completed,
                                "taskCount": cell.task_count,
                            })
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}
