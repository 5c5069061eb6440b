use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use super::{TaskStore, Timeline};
use crate::error::ScheduleError;

/// What part of a bar the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    ResizeStart,
    ResizeEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub task: Uuid,
    pub mode: DragMode,
    anchor_x: f32,
    /// Latest pointer x seen, used when release arrives without a position.
    last_x: f32,
    /// Scale at `begin`; zooming mid-gesture does not change the result.
    pixels_per_day: f64,
    pub original_start: NaiveDate,
    pub original_end: NaiveDate,
    /// Candidate range from the latest pointer position.
    pub preview: (NaiveDate, NaiveDate),
}

impl DragState {
    /// Candidate dates for a pointer at `x`. Resizes never cross over.
    fn candidate(&self, x: f32) -> (NaiveDate, NaiveDate) {
        let days = ((x - self.anchor_x) as f64 / self.pixels_per_day).round() as i64;
        let delta = Duration::days(days);
        match self.mode {
            DragMode::Move => (self.original_start + delta, self.original_end + delta),
            DragMode::ResizeStart => {
                ((self.original_start + delta).min(self.original_end), self.original_end)
            }
            DragMode::ResizeEnd => {
                (self.original_start, (self.original_end + delta).max(self.original_start))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging(DragState),
}

/// How a released gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// New dates were validated and written to the store.
    Committed {
        task: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Validation failed; the store still holds the original dates.
    RolledBack {
        task: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        error: ScheduleError,
    },
    /// The pointer came back to where it started.
    Unchanged { task: Uuid },
    /// No gesture was active.
    Ignored,
}

/// Pointer gesture state machine for task bars.
///
/// Only one gesture can be active at a time. Previews never touch the
/// store; the store only changes on a successful [`release`](Self::release).
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    gesture: Gesture,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging(_))
    }

    pub fn active_task(&self) -> Option<Uuid> {
        match &self.gesture {
            Gesture::Dragging(drag) => Some(drag.task),
            Gesture::Idle => None,
        }
    }

    /// Preview range for `task` if it is the one being dragged.
    pub fn preview_for(&self, task: Uuid) -> Option<(NaiveDate, NaiveDate)> {
        match &self.gesture {
            Gesture::Dragging(drag) if drag.task == task => Some(drag.preview),
            _ => None,
        }
    }

    /// Pointer x of the most recent update.
    pub fn last_x(&self) -> Option<f32> {
        match &self.gesture {
            Gesture::Dragging(drag) => Some(drag.last_x),
            Gesture::Idle => None,
        }
    }

    /// Start a gesture on `task` at the timeline's current scale. Returns
    /// false if another gesture is in flight or the task does not exist.
    pub fn begin(
        &mut self,
        store: &TaskStore,
        timeline: &Timeline,
        task: Uuid,
        mode: DragMode,
        x: f32,
    ) -> bool {
        if self.is_dragging() {
            return false;
        }
        let Some(t) = store.get(task) else {
            return false;
        };
        self.gesture = Gesture::Dragging(DragState {
            task,
            mode,
            anchor_x: x,
            last_x: x,
            pixels_per_day: timeline.pixels_per_day(),
            original_start: t.start_date,
            original_end: t.end_date,
            preview: (t.start_date, t.end_date),
        });
        true
    }

    /// Update the live preview for a pointer at `x`.
    pub fn update(&mut self, x: f32) -> Option<(NaiveDate, NaiveDate)> {
        match &mut self.gesture {
            Gesture::Dragging(drag) => {
                drag.last_x = x;
                drag.preview = drag.candidate(x);
                Some(drag.preview)
            }
            Gesture::Idle => None,
        }
    }

    /// Finish the gesture at `x`: validate and commit, or roll back.
    pub fn release(&mut self, x: f32, store: &mut TaskStore) -> DragOutcome {
        let Gesture::Dragging(drag) = std::mem::take(&mut self.gesture) else {
            return DragOutcome::Ignored;
        };
        let (start, end) = drag.candidate(x);
        if (start, end) == (drag.original_start, drag.original_end) {
            return DragOutcome::Unchanged { task: drag.task };
        }

        match store.update_dates(drag.task, start, end) {
            Ok(()) => {
                log::info!("committed {} -> {} for task {}", start, end, drag.task);
                DragOutcome::Committed {
                    task: drag.task,
                    start,
                    end,
                }
            }
            Err(error) => {
                log::warn!("rolled back drag of task {}: {}", drag.task, error);
                DragOutcome::RolledBack {
                    task: drag.task,
                    start: drag.original_start,
                    end: drag.original_end,
                    error,
                }
            }
        }
    }

    /// Drop the current gesture without committing. Only used when the
    /// dragged task disappears before the pointer is released.
    pub fn abort(&mut self) {
        self.gesture = Gesture::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, TimelineScale};
    use proptest::prelude::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn day_timeline(store: &TaskStore) -> Timeline {
        Timeline::fit(store.tasks(), TimelineScale::Day, d(8, 1))
    }

    fn single(start: NaiveDate, end: NaiveDate) -> (TaskStore, Uuid) {
        let mut store = TaskStore::new();
        let id = store.add_task(Task::new("Drywall", start, end), d(8, 1)).unwrap();
        (store, id)
    }

    #[test]
    fn move_shifts_both_dates() {
        let (mut store, id) = single(d(8, 5), d(8, 8));
        let tl = day_timeline(&store);
        let mut ctl = InteractionController::new();
        assert!(ctl.begin(&store, &tl, id, DragMode::Move, 100.0));
        // 40 px per day at day scale.
        assert_eq!(ctl.update(181.0), Some((d(8, 7), d(8, 10))));
        assert_eq!(store.get(id).unwrap().start_date, d(8, 5));

        let outcome = ctl.release(180.0, &mut store);
        assert_eq!(
            outcome,
            DragOutcome::Committed { task: id, start: d(8, 7), end: d(8, 10) }
        );
        assert!(!ctl.is_dragging());
        assert_eq!(store.get(id).unwrap().end_date, d(8, 10));
    }

    #[test]
    fn resizes_clamp() {
        let (mut store, id) = single(d(8, 5), d(8, 8));
        let tl = day_timeline(&store);
        let mut ctl = InteractionController::new();

        ctl.begin(&store, &tl, id, DragMode::ResizeEnd, 0.0);
        assert_eq!(ctl.update(-400.0), Some((d(8, 5), d(8, 5))));
        ctl.release(-400.0, &mut store);
        let t = store.get(id).unwrap();
        assert_eq!((t.start_date, t.end_date), (d(8, 5), d(8, 5)));

        ctl.begin(&store, &tl, id, DragMode::ResizeStart, 0.0);
        assert_eq!(ctl.update(400.0), Some((d(8, 5), d(8, 5))));
        assert_eq!(ctl.update(-80.0), Some((d(8, 3), d(8, 5))));
    }

    #[test]
    fn only_one_gesture_at_a_time() {
        let (store, id) = single(d(8, 5), d(8, 8));
        let tl = day_timeline(&store);
        let mut ctl = InteractionController::new();
        assert!(ctl.begin(&store, &tl, id, DragMode::Move, 0.0));
        assert!(!ctl.begin(&store, &tl, id, DragMode::ResizeEnd, 10.0));
        assert!(!InteractionController::new().begin(&store, &tl, Uuid::new_v4(), DragMode::Move, 0.0));
    }

    #[test]
    fn release_without_gesture_or_movement() {
        let (mut store, id) = single(d(8, 5), d(8, 8));
        let tl = day_timeline(&store);
        let mut ctl = InteractionController::new();
        assert_eq!(ctl.release(0.0, &mut store), DragOutcome::Ignored);
        ctl.begin(&store, &tl, id, DragMode::Move, 50.0);
        assert_eq!(ctl.release(60.0, &mut store), DragOutcome::Unchanged { task: id });
    }

    #[test]
    fn zooming_mid_drag_commits_the_previewed_range() {
        let (mut store, id) = single(d(8, 5), d(8, 8));
        let mut tl = day_timeline(&store);
        let mut ctl = InteractionController::new();
        ctl.begin(&store, &tl, id, DragMode::Move, 0.0);
        assert_eq!(ctl.update(80.0), Some((d(8, 7), d(8, 10))));

        tl.zoom_out();
        tl.zoom_out();
        assert_eq!(tl.scale, TimelineScale::Month);
        assert_eq!(
            ctl.release(80.0, &mut store),
            DragOutcome::Committed { task: id, start: d(8, 7), end: d(8, 10) }
        );
    }

    #[test]
    fn gesture_stays_active_until_release() {
        let (mut store, id) = single(d(8, 5), d(8, 8));
        let tl = day_timeline(&store);
        let mut ctl = InteractionController::new();
        ctl.begin(&store, &tl, id, DragMode::ResizeEnd, 0.0);
        for x in [40.0, 120.0, -40.0, 200.0] {
            ctl.update(x);
            assert_eq!(ctl.active_task(), Some(id));
        }
        assert!(matches!(
            ctl.release(200.0, &mut store),
            DragOutcome::Committed { .. }
        ));
        assert_eq!(ctl.gesture(), &Gesture::Idle);
        assert_eq!(store.get(id).unwrap().end_date, d(8, 13));
    }

    proptest! {
        #[test]
        fn resize_commits_keep_start_before_end(
            len in 0i64..30,
            dx in -3000.0f32..3000.0,
            start_side in any::<bool>(),
        ) {
            let (mut store, id) = single(d(8, 5), d(8, 5) + Duration::days(len));
            let tl = day_timeline(&store);
            let mode = if start_side { DragMode::ResizeStart } else { DragMode::ResizeEnd };
            let mut ctl = InteractionController::new();
            ctl.begin(&store, &tl, id, mode, 0.0);
            let (s, e) = ctl.update(dx).unwrap();
            prop_assert!(s <= e);
            ctl.release(dx, &mut store);
            let t = store.get(id).unwrap();
            prop_assert!(t.start_date <= t.end_date);
        }
    }
}
