use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a task stands on site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Delayed,
}

impl TaskStatus {
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::NotStarted,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Delayed,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not started",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Delayed => "Delayed",
        }
    }

    /// Statuses that require every prerequisite to be completed.
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::InProgress | TaskStatus::Completed)
    }

    /// Parse a free-form status string (English or Spanish).
    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s.trim().to_lowercase().as_str() {
            "not started" | "not-started" | "notstarted" | "new" | "planned" | "pending"
            | "no iniciado" | "pendiente" => Some(TaskStatus::NotStarted),
            "in progress" | "in-progress" | "inprogress" | "active" | "started"
            | "en progreso" | "en curso" => Some(TaskStatus::InProgress),
            "completed" | "complete" | "done" | "finished" | "completado" | "terminado" => {
                Some(TaskStatus::Completed)
            }
            "delayed" | "late" | "blocked" | "retrasado" | "atrasado" => Some(TaskStatus::Delayed),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single unit of schedulable work on the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: TaskStatus,
    /// Prerequisite task ids. Kept free of duplicates and self references.
    #[serde(default)]
    pub depends_on: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_unit: Option<String>,
    /// Monetary value of the work, used to weight earned value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_worker_id: Option<Uuid>,
    #[serde(default)]
    pub photo_ids: Vec<Uuid>,
}

impl Task {
    /// Create a new task with no prerequisites. Dates are swapped if given
    /// in the wrong order.
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            start_date: start.min(end),
            end_date: end.max(start),
            status: TaskStatus::NotStarted,
            depends_on: Vec::new(),
            total_volume: None,
            completed_volume: None,
            volume_unit: None,
            total_value: None,
            completion_date: None,
            assigned_worker_id: None,
            photo_ids: Vec::new(),
        }
    }

    /// Calendar days covered, inclusive of both ends.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn depends_on(&self, id: Uuid) -> bool {
        self.depends_on.contains(&id)
    }

    /// Physical progress from 0.0 to 1.0.
    ///
    /// Uses the volume fields when a positive total is recorded, otherwise
    /// falls back to the status (completed counts as done, anything else
    /// as not yet earned).
    pub fn progress_ratio(&self) -> f64 {
        match (self.total_volume, self.completed_volume) {
            (Some(total), Some(done)) if total > 0.0 => (done / total).clamp(0.0, 1.0),
            (Some(total), None) if total > 0.0 => 0.0,
            _ => {
                if self.status == TaskStatus::Completed {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Status implied by the recorded volumes, if any.
    ///
    /// `completed >= total` means Completed, a partial volume means
    /// InProgress unless the task is already flagged Delayed. With no
    /// volumes (or nothing done yet) the manual status stands.
    pub fn volume_status(&self) -> Option<TaskStatus> {
        let (total, done) = match (self.total_volume, self.completed_volume) {
            (Some(total), Some(done)) if total > 0.0 => (total, done),
            _ => return None,
        };
        if done >= total {
            Some(TaskStatus::Completed)
        } else if done > 0.0 {
            if self.status == TaskStatus::Delayed {
                Some(TaskStatus::Delayed)
            } else {
                Some(TaskStatus::InProgress)
            }
        } else {
            None
        }
    }

    /// Apply the volume rule and stamp or clear the completion date.
    pub fn derive_status(&mut self, today: NaiveDate) {
        if let Some(status) = self.volume_status() {
            self.status = status;
        }
        if self.status == TaskStatus::Completed {
            if self.completion_date.is_none() {
                self.completion_date = Some(today);
            }
        } else {
            self.completion_date = None;
        }
    }

    /// Overdue: past its end date and not completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Completed && self.end_date < today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn new_task_defaults() {
        let t = Task::new("Pour slab", d(2024, 8, 10), d(2024, 8, 5));
        assert_eq!(t.start_date, d(2024, 8, 5));
        assert_eq!(t.end_date, d(2024, 8, 10));
        assert_eq!(t.status, TaskStatus::NotStarted);
        assert!(t.depends_on.is_empty());
        assert_eq!(t.duration_days(), 6);
    }

    #[test]
    fn volume_drives_status() {
        let today = d(2024, 8, 20);
        let mut t = Task::new("Brickwork", d(2024, 8, 1), d(2024, 8, 15));
        t.total_volume = Some(120.0);
        t.completed_volume = Some(30.0);
        t.derive_status(today);
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.completion_date, None);
        assert!((t.progress_ratio() - 0.25).abs() < 1e-9);

        t.status = TaskStatus::Delayed;
        t.derive_status(today);
        assert_eq!(t.status, TaskStatus::Delayed);

        t.completed_volume = Some(130.0);
        t.derive_status(today);
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.completion_date, Some(today));
        assert_eq!(t.progress_ratio(), 1.0);
    }

    #[test]
    fn completion_date_cleared_when_reopened() {
        let mut t = Task::new("Roofing", d(2024, 8, 1), d(2024, 8, 3));
        t.status = TaskStatus::Completed;
        t.derive_status(d(2024, 8, 3));
        assert_eq!(t.completion_date, Some(d(2024, 8, 3)));

        // Re-deriving later keeps the original stamp.
        t.derive_status(d(2024, 8, 9));
        assert_eq!(t.completion_date, Some(d(2024, 8, 3)));

        t.status = TaskStatus::InProgress;
        t.derive_status(d(2024, 8, 9));
        assert_eq!(t.completion_date, None);
    }

    #[test]
    fn manual_status_stands_without_volumes() {
        let mut t = Task::new("Survey", d(2024, 8, 1), d(2024, 8, 3));
        t.status = TaskStatus::Delayed;
        t.total_volume = Some(10.0);
        t.completed_volume = Some(0.0);
        t.derive_status(d(2024, 8, 2));
        assert_eq!(t.status, TaskStatus::Delayed);
    }

    #[test]
    fn parses_spanish_status_names() {
        assert_eq!(TaskStatus::parse("Completado"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse(" en progreso "), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("No iniciado"), Some(TaskStatus::NotStarted));
        assert_eq!(TaskStatus::parse("retrasado"), Some(TaskStatus::Delayed));
        assert_eq!(TaskStatus::parse("whatever"), None);
    }

    #[test]
    fn serializes_iso_dates_and_camel_case() {
        let t = Task::new("Excavation", d(2024, 8, 1), d(2024, 8, 5));
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["startDate"], "2024-08-01");
        assert_eq!(json["endDate"], "2024-08-05");
        assert_eq!(json["status"], "NotStarted");
        assert!(json["dependsOn"].as_array().unwrap().is_empty());
        assert!(json.get("totalVolume").is_none());
    }
}
