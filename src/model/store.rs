use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_dates, validate_edit, validate_status};
use super::{DependencyGraph, Task, TaskStatus};
use crate::error::ScheduleError;

/// Owns the ordered task collection and guards its invariants.
///
/// Every mutation that can break dependency ordering is validated before
/// it lands; a rejected mutation leaves the store untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an arbitrary list, cleaning up references.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut store = Self::new();
        store.replace_all(tasks);
        store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Snapshot of every task, in display order.
    pub fn list(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.tasks)
    }

    /// Replace the whole collection.
    ///
    /// Later duplicates of an id are dropped, and `depends_on` lists are
    /// stripped of self references, repeats, and ids not in the new set.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut seen = HashSet::new();
        let mut tasks: Vec<Task> = tasks.into_iter().filter(|t| seen.insert(t.id)).collect();
        for task in &mut tasks {
            let own = task.id;
            let mut kept = HashSet::new();
            task.depends_on
                .retain(|id| *id != own && seen.contains(id) && kept.insert(*id));
            if task.start_date > task.end_date {
                std::mem::swap(&mut task.start_date, &mut task.end_date);
            }
        }
        self.tasks = tasks;
    }

    /// Append a new task.
    ///
    /// Its prerequisites must exist, and its dates and status must respect
    /// them. A new task has no dependents yet, so no cycle can form.
    pub fn add_task(&mut self, mut task: Task, today: NaiveDate) -> Result<Uuid, ScheduleError> {
        if self.get(task.id).is_some() {
            return Err(ScheduleError::DuplicateTask(task.id));
        }
        check_range(task.start_date, task.end_date)?;
        self.check_prerequisites(&task)?;
        task.derive_status(today);
        validate_dates(&task, task.start_date, task.end_date, &self.tasks)?;
        validate_status(&task, &self.tasks)?;

        let id = task.id;
        log::debug!("adding task '{}' ({})", task.name, id);
        self.tasks.push(task);
        Ok(id)
    }

    /// Move a task to new dates after checking both neighbours.
    pub fn update_dates(
        &mut self,
        id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), ScheduleError> {
        check_range(start, end)?;
        let index = self.index_of(id)?;
        validate_dates(&self.tasks[index], start, end, &self.tasks)?;

        let task = &mut self.tasks[index];
        task.start_date = start;
        task.end_date = end;
        Ok(())
    }

    /// Replace a task with an edited copy (the form path).
    ///
    /// The volume rule and completion date are applied to `proposed` before
    /// validation, so the derived status must pass the gate too.
    pub fn update_task(&mut self, mut proposed: Task, today: NaiveDate) -> Result<(), ScheduleError> {
        let index = self.index_of(proposed.id)?;
        check_range(proposed.start_date, proposed.end_date)?;
        dedup(&mut proposed.depends_on);
        self.check_prerequisites(&proposed)?;
        proposed.derive_status(today);
        validate_edit(&self.tasks[index], &proposed, &self.tasks)?;

        self.tasks[index] = proposed;
        Ok(())
    }

    /// Change only the status of a task.
    pub fn set_status(
        &mut self,
        id: Uuid,
        status: TaskStatus,
        today: NaiveDate,
    ) -> Result<(), ScheduleError> {
        let mut proposed = self.get(id).cloned().ok_or(ScheduleError::UnknownTask(id))?;
        proposed.status = status;
        self.update_task(proposed, today)
    }

    /// Make `task` depend on `prerequisite`.
    ///
    /// Rejected when either id is unknown, the edge would close a cycle, or
    /// the current dates/status would violate the new ordering. Adding an
    /// existing edge is a no-op.
    pub fn add_dependency(&mut self, task: Uuid, prerequisite: Uuid) -> Result<(), ScheduleError> {
        let index = self.index_of(task)?;
        let pre = self.get(prerequisite).ok_or(ScheduleError::UnknownTask(prerequisite))?;
        let current = &self.tasks[index];
        if task == prerequisite {
            return Err(ScheduleError::SelfDependency(current.name.clone()));
        }
        if current.depends_on(prerequisite) {
            return Ok(());
        }
        if self.graph().would_create_cycle(task, prerequisite) {
            return Err(ScheduleError::DependencyCycle {
                task: current.name.clone(),
                prerequisite: pre.name.clone(),
            });
        }

        let mut proposed = current.clone();
        proposed.depends_on.push(prerequisite);
        validate_edit(current, &proposed, &self.tasks)?;

        log::debug!("'{}' now depends on '{}'", proposed.name, pre.name);
        self.tasks[index] = proposed;
        Ok(())
    }

    /// Drop a dependency edge. Returns whether it existed.
    pub fn remove_dependency(&mut self, task: Uuid, prerequisite: Uuid) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task) {
            Some(t) => {
                let before = t.depends_on.len();
                t.depends_on.retain(|id| *id != prerequisite);
                t.depends_on.len() != before
            }
            None => false,
        }
    }

    /// Delete a task and strip its id from every other task's prerequisites.
    pub fn remove_task(&mut self, id: Uuid) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(index);
        for task in &mut self.tasks {
            task.depends_on.retain(|pre| *pre != id);
        }
        Some(removed)
    }

    /// Clear a worker assignment everywhere it appears.
    pub fn unassign_worker(&mut self, worker: Uuid) {
        for task in &mut self.tasks {
            if task.assigned_worker_id == Some(worker) {
                task.assigned_worker_id = None;
            }
        }
    }

    fn index_of(&self, id: Uuid) -> Result<usize, ScheduleError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(ScheduleError::UnknownTask(id))
    }

    fn check_prerequisites(&self, task: &Task) -> Result<(), ScheduleError> {
        let graph = self.graph();
        for &pre in &task.depends_on {
            if pre == task.id {
                return Err(ScheduleError::SelfDependency(task.name.clone()));
            }
            let Some(pre_task) = self.get(pre) else {
                return Err(ScheduleError::UnknownTask(pre));
            };
            if graph.would_create_cycle(task.id, pre) {
                return Err(ScheduleError::DependencyCycle {
                    task: task.name.clone(),
                    prerequisite: pre_task.name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ScheduleError> {
    if start > end {
        Err(ScheduleError::InvalidRange { start, end })
    } else {
        Ok(())
    }
}

fn dedup(ids: &mut Vec<Uuid>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
}
