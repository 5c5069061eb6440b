use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::model::TaskStatus;

/// A proposed edit would break the ordering between dependent tasks.
///
/// Every variant names the *other* task involved so the UI can tell the
/// user exactly which dependency got in the way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleConflict {
    #[error("'{name}' finishes on {end}, so this task cannot start on {proposed_start}")]
    PredecessorEndsLater {
        task: Uuid,
        name: String,
        end: NaiveDate,
        proposed_start: NaiveDate,
    },
    #[error("'{name}' starts on {start}, so this task cannot end on {proposed_end}")]
    SuccessorStartsEarlier {
        task: Uuid,
        name: String,
        start: NaiveDate,
        proposed_end: NaiveDate,
    },
    #[error("'{name}' is still {status}; it must be completed first")]
    PredecessorIncomplete {
        task: Uuid,
        name: String,
        status: TaskStatus,
    },
}

impl ScheduleConflict {
    /// Id of the task that caused the conflict.
    pub fn other_task(&self) -> Uuid {
        match self {
            Self::PredecessorEndsLater { task, .. }
            | Self::SuccessorStartsEarlier { task, .. }
            | Self::PredecessorIncomplete { task, .. } => *task,
        }
    }
}

/// Failures of [`TaskStore`](crate::model::TaskStore) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Conflict(#[from] ScheduleConflict),
    #[error("no task with id {0}")]
    UnknownTask(Uuid),
    #[error("a task with id {0} already exists")]
    DuplicateTask(Uuid),
    #[error("'{0}' cannot depend on itself")]
    SelfDependency(String),
    #[error("linking '{task}' after '{prerequisite}' would create a dependency cycle")]
    DependencyCycle { task: String, prerequisite: String },
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Failures while reading or writing project files.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid project file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(
        "CSV is missing required columns. Found headers: {0:?}. \
         Need columns for: task name, start date, end date."
    )]
    MissingColumns(Vec<String>),
    #[error("no valid tasks found in CSV ({skipped} rows skipped)")]
    NoTasks { skipped: usize },
}
