use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use uuid::Uuid;

use site_planner::error::{ScheduleConflict, ScheduleError};
use site_planner::io::{load_project, save_project};
use site_planner::model::{
    DragMode, DragOutcome, InteractionController, Project, Task, TaskStatus, TaskStore, Timeline,
    TimelineScale,
};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
}

fn today() -> NaiveDate {
    d(1)
}

/// "Formwork" (P) runs 08-01..08-05 and "Pour slab" (T) starts back to back.
fn formwork_then_pour() -> (TaskStore, Uuid, Uuid) {
    let mut store = TaskStore::new();
    let p = store
        .add_task(Task::new("Formwork", d(1), d(5)), today())
        .unwrap();
    let mut pour = Task::new("Pour slab", d(5), d(8));
    pour.depends_on = vec![p];
    let t = store.add_task(pour, today()).unwrap();
    (store, p, t)
}

#[test]
fn test_back_to_back_dates_allowed() {
    let (mut store, _, t) = formwork_then_pour();
    assert!(store.update_dates(t, d(5), d(9)).is_ok());
    assert_eq!(store.get(t).unwrap().end_date, d(9));
}

#[test]
fn test_start_before_prerequisite_end_rejected() {
    let (mut store, p, t) = formwork_then_pour();
    let before = store.list();

    let err = store.update_dates(t, d(3), d(8)).unwrap_err();
    match err {
        ScheduleError::Conflict(ScheduleConflict::PredecessorEndsLater { task, name, .. }) => {
            assert_eq!(task, p);
            assert_eq!(name, "Formwork");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.list(), before);
}

#[test]
fn test_status_gate_names_prerequisite() {
    let (mut store, p, t) = formwork_then_pour();
    store.set_status(p, TaskStatus::InProgress, today()).unwrap();

    let err = store.set_status(t, TaskStatus::Completed, today()).unwrap_err();
    assert!(err.to_string().contains("Formwork"));
    assert!(matches!(
        err,
        ScheduleError::Conflict(ScheduleConflict::PredecessorIncomplete { task, .. }) if task == p
    ));
    assert_eq!(store.get(t).unwrap().status, TaskStatus::NotStarted);

    store.set_status(p, TaskStatus::Completed, today()).unwrap();
    store.set_status(t, TaskStatus::Completed, d(9)).unwrap();
    assert_eq!(store.get(t).unwrap().completion_date, Some(d(9)));
}

#[test]
fn test_drag_into_successor_rolls_back() {
    let mut store = TaskStore::new();
    let t = store
        .add_task(Task::new("Rebar", d(6), d(10)), today())
        .unwrap();
    let mut inspection = Task::new("Inspection", d(12), d(13));
    inspection.depends_on = vec![t];
    store.add_task(inspection, today()).unwrap();

    let timeline = Timeline::fit(store.tasks(), TimelineScale::Day, today());
    let mut controller = InteractionController::new();
    assert!(controller.begin(&store, &timeline, t, DragMode::ResizeEnd, 500.0));

    // Three days to the right at 40 px per day.
    let preview = controller.update(620.0);
    assert_eq!(preview, Some((d(6), d(13))));
    assert_eq!(store.get(t).unwrap().end_date, d(10));

    match controller.release(620.0, &mut store) {
        DragOutcome::RolledBack { task, start, end, error } => {
            assert_eq!(task, t);
            assert_eq!((start, end), (d(6), d(10)));
            assert!(error.to_string().contains("Inspection"));
        }
        other => panic!("expected rollback, got {other:?}"),
    }
    let stored = store.get(t).unwrap();
    assert_eq!((stored.start_date, stored.end_date), (d(6), d(10)));
    assert!(!controller.is_dragging());
    assert_eq!(controller.preview_for(t), None);
}

#[test]
fn test_delete_leaves_no_dangling_links() {
    let (mut store, p, t) = formwork_then_pour();
    let mut cure = Task::new("Cure", d(8), d(15));
    cure.depends_on = vec![p, t];
    let cure = store.add_task(cure, today()).unwrap();

    let removed = store.remove_task(p).unwrap();
    assert_eq!(removed.name, "Formwork");
    assert!(store.get(p).is_none());
    for task in store.tasks() {
        assert!(!task.depends_on.contains(&p));
    }
    assert_eq!(store.get(cure).unwrap().depends_on, vec![t]);
    assert!(store.remove_task(p).is_none());
}

#[test]
fn test_timeline_refits_after_delete() {
    let mut store = TaskStore::new();
    let survey = store
        .add_task(Task::new("Survey", d(1), d(2)), today())
        .unwrap();
    store
        .add_task(Task::new("Framing", d(12), d(20)), today())
        .unwrap();
    let mut timeline = Timeline::fit(store.tasks(), TimelineScale::Day, d(14));
    let before = timeline.start;

    store.remove_task(survey).unwrap();
    timeline.refit(store.tasks(), d(14));
    assert!(timeline.start > before);
    assert!(timeline.start <= d(12));
    assert_eq!(timeline.scale, TimelineScale::Day);
}

#[test]
fn test_cycle_rejected() {
    let (mut store, p, t) = formwork_then_pour();
    let err = store.add_dependency(p, t).unwrap_err();
    assert!(matches!(err, ScheduleError::DependencyCycle { .. }));
    assert!(store.get(p).unwrap().depends_on.is_empty());

    let err = store.add_dependency(p, p).unwrap_err();
    assert!(matches!(err, ScheduleError::SelfDependency(_)));
    assert!(store.graph().topological_order().is_ok());
}

#[test]
fn test_volume_drives_status() {
    let mut store = TaskStore::new();
    let mut slab = Task::new("Slab", d(1), d(4));
    slab.total_volume = Some(30.0);
    slab.completed_volume = Some(10.0);
    let id = store.add_task(slab, today()).unwrap();
    assert_eq!(store.get(id).unwrap().status, TaskStatus::InProgress);

    let mut finished = store.get(id).cloned().unwrap();
    finished.completed_volume = Some(30.0);
    store.update_task(finished, d(4)).unwrap();
    let slab = store.get(id).unwrap();
    assert_eq!(slab.status, TaskStatus::Completed);
    assert_eq!(slab.completion_date, Some(d(4)));
}

#[test]
fn test_project_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warehouse.site.json");
    let (store, _, _) = formwork_then_pour();
    let mut project = Project::new("Warehouse");
    project.store = store;

    save_project(&project, &path).unwrap();
    let loaded = load_project(&path).unwrap();
    assert_eq!(loaded.store.list(), project.store.list());
    assert_eq!(loaded.name, "Warehouse");
}

#[test]
fn test_coordinate_round_trip_per_scale() {
    let tasks = vec![Task::new("Grading", d(1), d(31))];
    for scale in [TimelineScale::Day, TimelineScale::Week, TimelineScale::Month] {
        let timeline = Timeline::fit(&tasks, scale, today());
        for day in 1..=31 {
            let date = d(day);
            let back = timeline.offset_to_date(timeline.date_to_offset(date));
            let slack = if scale == TimelineScale::Month { 1 } else { 0 };
            assert!((back - date).num_days().abs() <= slack, "{scale:?} {date}");
        }
    }
}

proptest! {
    #[test]
    fn committed_drags_keep_prerequisites_first(
        moves in prop::collection::vec((0usize..3, 0usize..3, -400.0f32..400.0), 1..12)
    ) {
        let (mut store, p, t) = formwork_then_pour();
        let mut walls = Task::new("Walls", d(9), d(14));
        walls.depends_on = vec![t];
        let w = store.add_task(walls, today()).unwrap();
        let ids = [p, t, w];
        let modes = [DragMode::Move, DragMode::ResizeStart, DragMode::ResizeEnd];
        let timeline = Timeline::fit(store.tasks(), TimelineScale::Day, today());

        for (which, mode, dx) in moves {
            let mut controller = InteractionController::new();
            prop_assert!(controller.begin(&store, &timeline, ids[which], modes[mode], 0.0));
            controller.update(dx);
            controller.release(dx, &mut store);

            for task in store.tasks() {
                prop_assert!(task.start_date <= task.end_date);
                for pre in &task.depends_on {
                    let pre = store.get(*pre).unwrap();
                    prop_assert!(task.start_date >= pre.end_date);
                }
            }
        }
    }

    #[test]
    fn moves_preserve_duration(len in 0i64..20, dx in -2000.0f32..2000.0) {
        let mut store = TaskStore::new();
        let id = store
            .add_task(Task::new("Paving", d(10), d(10) + Duration::days(len)), today())
            .unwrap();
        let timeline = Timeline::fit(store.tasks(), TimelineScale::Week, today());
        let mut controller = InteractionController::new();
        controller.begin(&store, &timeline, id, DragMode::Move, 0.0);
        controller.release(dx, &mut store);
        prop_assert_eq!(store.get(id).unwrap().duration_days(), len + 1);
    }
}
