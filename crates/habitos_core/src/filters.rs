use crate::error::AppError;
use crate::model::{Priority, Task, TaskStatus};
use crate::stats::{HabitStats, percentage};
use std::str::FromStr;
use time::{Date, Duration};

pub fn tasks_on(tasks: &[Task], date: Date) -> Vec<&Task> {
    tasks.iter().filter(|task| task.day() == Some(date)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Priority(Priority),
    Status(TaskStatus),
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Priority(priority) => task.priority == *priority,
            Self::Status(status) => task.status == *status,
        }
    }

    pub fn apply<'a>(&self, tasks: &[&'a Task]) -> Vec<&'a Task> {
        tasks.iter().copied().filter(|task| self.matches(task)).collect()
    }
}

/// A day's tasks split into the three status columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusGroups<'a> {
    pub not_started: Vec<&'a Task>,
    pub ongoing: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
}

impl<'a> StatusGroups<'a> {
    pub fn get(&self, status: TaskStatus) -> &[&'a Task] {
        match status {
            TaskStatus::NotStarted => &self.not_started,
            TaskStatus::Ongoing => &self.ongoing,
            TaskStatus::Completed => &self.completed,
        }
    }
}

pub fn group_by_status<'a>(tasks: &[&'a Task]) -> StatusGroups<'a> {
    let mut groups = StatusGroups::default();
    for &task in tasks {
        match task.status {
            TaskStatus::NotStarted => groups.not_started.push(task),
            TaskStatus::Ongoing => groups.ongoing.push(task),
            TaskStatus::Completed => groups.completed.push(task),
        }
    }
    groups
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayStats {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: u8,
}

pub fn day_stats(tasks: &[&Task]) -> DayStats {
    let completed = tasks.iter().filter(|task| task.is_completed()).count();
    DayStats {
        total: tasks.len(),
        completed,
        completion_rate: percentage(completed, tasks.len()),
    }
}

/// The Monday-to-Sunday week that contains `date`.
pub fn week_of(date: Date) -> [Date; 7] {
    let from_monday = i64::from(date.weekday().number_days_from_monday());
    let monday = date.saturating_sub(Duration::days(from_monday));
    std::array::from_fn(|offset| monday.saturating_add(Duration::days(offset as i64)))
}

/// Moves `date` by whole weeks; `None` past the calendar range.
pub fn shift_weeks(date: Date, weeks: i64) -> Option<Date> {
    weeks
        .checked_mul(7)
        .and_then(|days| date.checked_add(Duration::days(days)))
}

/// One column of the week calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekDay {
    pub date: Date,
    pub stats: DayStats,
}

impl WeekDay {
    /// Every task of the day is completed. A day without tasks never is.
    pub fn all_done(&self) -> bool {
        self.stats.total > 0 && self.stats.completed == self.stats.total
    }
}

pub fn week_summary(tasks: &[Task], date: Date) -> [WeekDay; 7] {
    week_of(date).map(|day| WeekDay {
        date: day,
        stats: day_stats(&tasks_on(tasks, day)),
    })
}

/// Which habits the habit board shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HabitFilter {
    #[default]
    All,
    /// At least one task today.
    Active,
    /// At least one completed task today.
    Completed,
}

impl HabitFilter {
    pub fn matches(&self, stats: &HabitStats) -> bool {
        match self {
            Self::All => true,
            Self::Active => stats.total_today > 0,
            Self::Completed => stats.completed_today > 0,
        }
    }
}

impl FromStr for HabitFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(AppError::invalid_input(format!(
                "filter must be all, active or completed, got '{other}'"
            ))),
        }
    }
}
