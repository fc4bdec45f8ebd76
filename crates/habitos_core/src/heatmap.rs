use crate::stats::{DaySummary, HabitStats};
use std::collections::HashMap;
use time::{Date, Duration};

pub const DEFAULT_WEEKS: usize = 52;
pub const MAX_WEEKS: usize = 520;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapCell {
    pub date: Date,
    pub completed: bool,
    pub task_count: usize,
}

/// One column of the grid, oldest day first.
pub type HeatmapWeek = [HeatmapCell; 7];

/// GitHub-style contribution grid ending at `stats.today`.
///
/// Columns run oldest to newest and the last cell of the last column is
/// today. Days outside the habit's rolling window render as empty.
pub fn heatmap(stats: &HabitStats, weeks: usize) -> Vec<HeatmapWeek> {
    let weeks = weeks.min(MAX_WEEKS);
    let by_date: HashMap<Date, &DaySummary> = stats
        .daily_series
        .iter()
        .map(|day| (day.date, day))
        .collect();

    (0..weeks)
        .map(|week| {
            std::array::from_fn(|weekday| {
                let days_back = ((weeks - 1 - week) * 7 + (6 - weekday)) as i64;
                let date = stats
                    .today
                    .checked_sub(Duration::days(days_back))
                    .unwrap_or(Date::MIN);
                let summary = by_date.get(&date);
                HeatmapCell {
                    date,
                    completed: summary.is_some_and(|day| day.completed),
                    task_count: summary.map_or(0, |day| day.task_count),
                }
            })
        })
        .collect()
}
