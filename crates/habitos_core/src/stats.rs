//! Derived per-habit statistics.
//!
//! Everything here is a pure function of `(habit, tasks, today)`: no clock
//! reads, no hidden state. Callers recompute whenever an input changes.

use crate::model::{Habit, Task};
use std::collections::HashMap;
use time::{Date, Duration};

/// Upper bound on the backward streak walk (ten years).
pub const STREAK_LIMIT_DAYS: u32 = 3650;

/// One day of a habit's rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySummary {
    pub date: Date,
    /// At least one of the habit's tasks on this day is completed.
    pub completed: bool,
    pub task_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitStats {
    pub habit_id: String,
    pub today: Date,
    /// Rolling window, newest first: index 0 is `today`, the last entry is
    /// `today - (target_days - 1)`.
    pub daily_series: Vec<DaySummary>,
    pub completed_days: u32,
    /// `round(completed_days / target_days * 100)`, in `0..=100`.
    pub completion_rate: u8,
    pub streak: u32,
    /// The streak walk stopped at [`STREAK_LIMIT_DAYS`] rather than at a gap.
    pub streak_truncated: bool,
    pub today_tasks: Vec<Task>,
    pub completed_today: usize,
    pub total_today: usize,
    /// Share of today's tasks that are completed, in `0..=100`.
    pub progress: u8,
    pub total_tasks: usize,
    pub completed_tasks: usize,
}

impl HabitStats {
    /// The all-zero result reported for unusable inputs.
    pub fn empty(habit_id: &str, today: Date) -> Self {
        Self {
            habit_id: habit_id.to_string(),
            today,
            daily_series: Vec::new(),
            completed_days: 0,
            completion_rate: 0,
            streak: 0,
            streak_truncated: false,
            today_tasks: Vec::new(),
            completed_today: 0,
            total_today: 0,
            progress: 0,
            total_tasks: 0,
            completed_tasks: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DayBucket {
    task_count: usize,
    completed: bool,
}

/// Computes the statistics of `habit` from the full task list.
///
/// `tasks` must be the unfiltered collection; tasks of other habits are
/// ignored here. Tasks whose date does not parse never match any day. A
/// habit whose `target_days` is outside `1..=MAX_TARGET_DAYS` gets
/// [`HabitStats::empty`].
pub fn compute_habit_stats(habit: &Habit, tasks: &[Task], today: Date) -> HabitStats {
    let Some(window) = habit.window_days() else {
        tracing::warn!(
            habit_id = %habit.id,
            target_days = habit.target_days,
            "target days out of range, reporting empty stats"
        );
        return HabitStats::empty(&habit.id, today);
    };

    let habit_tasks: Vec<&Task> = tasks.iter().filter(|task| task.belongs_to(&habit.id)).collect();
    let buckets = bucket_by_day(&habit_tasks);

    let daily_series = window_series(&buckets, today, window);
    let completed_days = daily_series.iter().filter(|day| day.completed).count();
    let completion_rate = percentage(completed_days, window as usize);

    let (streak, streak_truncated) = streak_ending_at(&buckets, today);
    if streak_truncated {
        tracing::warn!(
            habit_id = %habit.id,
            limit = STREAK_LIMIT_DAYS,
            "streak walk hit its safety bound"
        );
    }

    let today_tasks: Vec<Task> = habit_tasks
        .iter()
        .filter(|task| task.day() == Some(today))
        .map(|task| (*task).clone())
        .collect();
    let completed_today = today_tasks.iter().filter(|task| task.is_completed()).count();
    let total_today = today_tasks.len();

    HabitStats {
        habit_id: habit.id.clone(),
        today,
        completed_days: u32::try_from(completed_days).unwrap_or(u32::MAX),
        completion_rate,
        streak,
        streak_truncated,
        completed_today,
        total_today,
        progress: percentage(completed_today, total_today),
        total_tasks: habit_tasks.len(),
        completed_tasks: habit_tasks.iter().filter(|task| task.is_completed()).count(),
        today_tasks,
        daily_series,
    }
}

/// Stats for every habit, in habit order.
pub fn compute_all(habits: &[Habit], tasks: &[Task], today: Date) -> Vec<HabitStats> {
    habits
        .iter()
        .map(|habit| compute_habit_stats(habit, tasks, today))
        .collect()
}

/// Dashboard summary across all habits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overview {
    pub total_habits: usize,
    /// Habits with at least one completed task today.
    pub habits_completed_today: usize,
    pub completion_rate: u8,
}

pub fn overview(habits: &[Habit], tasks: &[Task], today: Date) -> Overview {
    let habits_completed_today = habits
        .iter()
        .filter(|habit| {
            tasks.iter().any(|task| {
                task.belongs_to(&habit.id) && task.day() == Some(today) && task.is_completed()
            })
        })
        .count();

    Overview {
        total_habits: habits.len(),
        habits_completed_today,
        completion_rate: percentage(habits_completed_today, habits.len()),
    }
}

/// Rounded `part / whole` percentage (half rounds up), 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u128;
    let whole = whole as u128;
    ((part * 200 + whole) / (whole * 2)) as u8
}

fn bucket_by_day(tasks: &[&Task]) -> HashMap<Date, DayBucket> {
    let mut buckets: HashMap<Date, DayBucket> = HashMap::new();
    for task in tasks {
        let Some(day) = task.day() else {
            continue;
        };
        let bucket = buckets.entry(day).or_default();
        bucket.task_count += 1;
        bucket.completed |= task.is_completed();
    }
    buckets
}

fn window_series(buckets: &HashMap<Date, DayBucket>, today: Date, window: u32) -> Vec<DaySummary> {
    (0..i64::from(window))
        .map_while(|offset| today.checked_sub(Duration::days(offset)))
        .map(|date| {
            let bucket = buckets.get(&date).copied().unwrap_or_default();
            DaySummary {
                date,
                completed: bucket.completed,
                task_count: bucket.task_count,
            }
        })
        .collect()
}

/// Consecutive completed days walking back from `today`. Returns the count
/// and whether the walk was cut off by [`STREAK_LIMIT_DAYS`].
fn streak_ending_at(buckets: &HashMap<Date, DayBucket>, today: Date) -> (u32, bool) {
    let mut streak = 0;
    let mut day = today;

    loop {
        let completed = buckets.get(&day).is_some_and(|bucket| bucket.completed);
        if !completed {
            return (streak, false);
        }
        if streak == STREAK_LIMIT_DAYS {
            return (streak, true);
        }
        streak += 1;

        match day.previous_day() {
            Some(previous) => day = previous,
            None => return (streak, false),
        }
    }
}
