use super::{Task, TaskStatus};

/// Site-wide progress summary shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressSummary {
    /// Earned value ratio, 0.0 to 1.0.
    pub earned: f64,
    pub completed: usize,
    pub in_progress: usize,
    pub delayed: usize,
    pub total: usize,
}

/// Earned-value progress over a task set.
///
/// Tasks are weighted by `total_value` when at least one task carries a
/// positive value; tasks without a value then weigh nothing. Otherwise
/// every task counts equally.
pub fn earned_value(tasks: &[Task]) -> f64 {
    let weighted: f64 = tasks
        .iter()
        .filter_map(|t| t.total_value.filter(|v| *v > 0.0))
        .sum();
    if weighted > 0.0 {
        let earned: f64 = tasks
            .iter()
            .filter_map(|t| t.total_value.filter(|v| *v > 0.0).map(|v| v * t.progress_ratio()))
            .sum();
        earned / weighted
    } else if tasks.is_empty() {
        0.0
    } else {
        tasks.iter().map(Task::progress_ratio).sum::<f64>() / tasks.len() as f64
    }
}

pub fn summarize(tasks: &[Task]) -> ProgressSummary {
    let count = |status| tasks.iter().filter(|t| t.status == status).count();
    ProgressSummary {
        earned: earned_value(tasks),
        completed: count(TaskStatus::Completed),
        in_progress: count(TaskStatus::InProgress),
        delayed: count(TaskStatus::Delayed),
        total: tasks.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(value: Option<f64>, total: f64, done: f64) -> Task {
        let day = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let mut t = Task::new("Work", day, day);
        t.total_value = value;
        t.total_volume = Some(total);
        t.completed_volume = Some(done);
        t
    }

    #[test]
    fn weights_by_value() {
        let tasks = vec![task(Some(9000.0), 10.0, 10.0), task(Some(1000.0), 10.0, 0.0)];
        assert!((earned_value(&tasks) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_plain_average() {
        let tasks = vec![task(None, 10.0, 5.0), task(None, 4.0, 4.0)];
        assert!((earned_value(&tasks) - 0.75).abs() < 1e-9);
        assert_eq!(earned_value(&[]), 0.0);
    }

    #[test]
    fn counts_statuses() {
        let mut a = task(None, 1.0, 1.0);
        a.status = TaskStatus::Completed;
        let mut b = task(None, 1.0, 0.0);
        b.status = TaskStatus::Delayed;
        let s = summarize(&[a, b]);
        assert_eq!((s.completed, s.delayed, s.in_progress, s.total), (1, 1, 0, 2));
    }
}
