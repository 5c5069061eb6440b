//! Ordering rules between dependent tasks.
//!
//! Both the drag path and the edit form go through these checks before
//! anything is written back to the store. Touching boundaries are allowed:
//! a task may start on the same day its prerequisite ends.

use chrono::NaiveDate;

use super::{DependencyGraph, Task};
use crate::error::ScheduleConflict;

/// Check that moving `task` to `[start, end]` keeps every prerequisite
/// before it and every dependent after it.
///
/// Predecessors are taken from `task.depends_on`; dependents are found by
/// scanning `all_tasks`. The first conflict found is returned.
pub fn validate_dates(
    task: &Task,
    start: NaiveDate,
    end: NaiveDate,
    all_tasks: &[Task],
) -> Result<(), ScheduleConflict> {
    for pre in predecessors_of(task, all_tasks) {
        if start < pre.end_date {
            return Err(ScheduleConflict::PredecessorEndsLater {
                task: pre.id,
                name: pre.name.clone(),
                end: pre.end_date,
                proposed_start: start,
            });
        }
    }

    let graph = DependencyGraph::build(all_tasks);
    for &succ_id in graph.successors(task.id) {
        let Some(succ) = all_tasks.iter().find(|t| t.id == succ_id) else {
            continue;
        };
        if succ.start_date < end {
            return Err(ScheduleConflict::SuccessorStartsEarlier {
                task: succ.id,
                name: succ.name.clone(),
                start: succ.start_date,
                proposed_end: end,
            });
        }
    }

    Ok(())
}

/// Status gate: a task cannot be in progress or completed while any of its
/// prerequisites is unfinished.
pub fn validate_status(task: &Task, all_tasks: &[Task]) -> Result<(), ScheduleConflict> {
    if !task.status.is_active() {
        return Ok(());
    }
    match predecessors_of(task, all_tasks).find(|p| p.status != super::TaskStatus::Completed) {
        Some(pre) => Err(ScheduleConflict::PredecessorIncomplete {
            task: pre.id,
            name: pre.name.clone(),
            status: pre.status,
        }),
        None => Ok(()),
    }
}

/// Full check used when a form submits `proposed` in place of `current`.
///
/// Dates are always checked. The status gate only runs when the status or
/// the prerequisite set actually changed, so editing the notes of a task
/// that was already under way is never blocked.
pub fn validate_edit(
    current: &Task,
    proposed: &Task,
    all_tasks: &[Task],
) -> Result<(), ScheduleConflict> {
    validate_dates(proposed, proposed.start_date, proposed.end_date, all_tasks)?;
    if current.status != proposed.status || current.depends_on != proposed.depends_on {
        validate_status(proposed, all_tasks)?;
    }
    Ok(())
}

fn predecessors_of<'a>(task: &'a Task, all_tasks: &'a [Task]) -> impl Iterator<Item = &'a Task> {
    task.depends_on
        .iter()
        .filter(move |id| **id != task.id)
        .filter_map(move |id| all_tasks.iter().find(|t| t.id == *id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn pair() -> (Task, Task) {
        let pre = Task::new("Formwork", d(8, 1), d(8, 5));
        let mut task = Task::new("Pour concrete", d(8, 6), d(8, 8));
        task.depends_on = vec![pre.id];
        (pre, task)
    }

    #[test]
    fn back_to_back_is_allowed() {
        let (pre, task) = pair();
        let all = vec![pre, task.clone()];
        assert_eq!(validate_dates(&task, d(8, 5), d(8, 8), &all), Ok(()));
    }

    #[test]
    fn start_before_predecessor_end_conflicts() {
        let (pre, task) = pair();
        let all = vec![pre.clone(), task.clone()];
        let err = validate_dates(&task, d(8, 3), d(8, 8), &all).unwrap_err();
        assert_eq!(err.other_task(), pre.id);
        assert!(matches!(
            err,
            ScheduleConflict::PredecessorEndsLater { end, .. } if end == d(8, 5)
        ));
        assert!(err.to_string().contains("Formwork"));
    }

    #[test]
    fn end_after_successor_start_conflicts() {
        let (pre, task) = pair();
        let all = vec![pre.clone(), task.clone()];
        let err = validate_dates(&pre, d(8, 1), d(8, 7), &all).unwrap_err();
        assert_eq!(err.other_task(), task.id);
        assert_eq!(validate_dates(&pre, d(8, 1), d(8, 6), &all), Ok(()));
    }

    #[test]
    fn missing_prerequisite_is_ignored() {
        let (_, task) = pair();
        let all = vec![task.clone()];
        assert_eq!(validate_dates(&task, d(7, 1), d(7, 2), &all), Ok(()));
    }

    #[test]
    fn status_gate_names_the_unfinished_prerequisite() {
        let (mut pre, task) = pair();
        pre.status = TaskStatus::InProgress;
        let all = vec![pre.clone(), task.clone()];

        let mut proposed = task.clone();
        proposed.status = TaskStatus::Completed;
        let err = validate_edit(&task, &proposed, &all).unwrap_err();
        assert_eq!(
            err,
            ScheduleConflict::PredecessorIncomplete {
                task: pre.id,
                name: "Formwork".into(),
                status: TaskStatus::InProgress,
            }
        );

        proposed.status = TaskStatus::Delayed;
        assert_eq!(validate_edit(&task, &proposed, &all), Ok(()));
    }

    #[test]
    fn unchanged_status_skips_gate() {
        let (pre, mut task) = pair();
        task.status = TaskStatus::InProgress;
        let all = vec![pre, task.clone()];
        let mut proposed = task.clone();
        proposed.description = "north wing".into();
        assert_eq!(validate_edit(&task, &proposed, &all), Ok(()));
    }
}
