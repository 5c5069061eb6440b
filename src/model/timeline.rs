use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Task;

/// Controls what granularity the timeline displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimelineScale {
    Day,
    #[default]
    Week,
    Month,
}

impl TimelineScale {
    /// Length of one column in days.
    pub fn unit_days(self) -> f64 {
        match self {
            TimelineScale::Day => 1.0,
            TimelineScale::Week => 7.0,
            TimelineScale::Month => 30.44,
        }
    }

    /// Width of one column in pixels.
    pub fn column_width(self) -> f64 {
        match self {
            TimelineScale::Day => 40.0,
            TimelineScale::Week => 100.0,
            TimelineScale::Month => 200.0,
        }
    }

    pub fn pixels_per_day(self) -> f64 {
        self.column_width() / self.unit_days()
    }

    pub fn label(self) -> &'static str {
        match self {
            TimelineScale::Day => "Days",
            TimelineScale::Week => "Weeks",
            TimelineScale::Month => "Months",
        }
    }
}

/// Maps calendar dates to horizontal pixel offsets and back.
///
/// Offsets are measured from `start`, which is always a Monday.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// First visible date (start of week).
    pub start: NaiveDate,
    /// Last visible date (end of week).
    pub end: NaiveDate,
    pub scale: TimelineScale,
}

impl Timeline {
    /// Fit the timeline around a task set.
    ///
    /// The range runs from the Monday on or before the earliest start to the
    /// Sunday on or after the latest end. With no tasks, a four-week window
    /// beginning with the week containing `today` is used.
    pub fn fit(tasks: &[Task], scale: TimelineScale, today: NaiveDate) -> Self {
        let min = tasks.iter().map(|t| t.start_date).min();
        let max = tasks.iter().map(|t| t.end_date).max();
        let (start, end) = match (min, max) {
            (Some(min), Some(max)) => (start_of_week(min), end_of_week(max)),
            _ => {
                let start = start_of_week(today);
                (start, start + Duration::days(27))
            }
        };
        Self { start, end, scale }
    }

    /// Recompute the visible range after the task set changed.
    pub fn refit(&mut self, tasks: &[Task], today: NaiveDate) {
        *self = Self::fit(tasks, self.scale, today);
    }

    pub fn pixels_per_day(&self) -> f64 {
        self.scale.pixels_per_day()
    }

    /// Convert a date to an x-pixel offset from the timeline start.
    pub fn date_to_offset(&self, date: NaiveDate) -> f32 {
        let days = (date - self.start).num_days() as f64;
        (days / self.scale.unit_days() * self.scale.column_width()) as f32
    }

    /// Convert an x-pixel offset back to the nearest date.
    pub fn offset_to_date(&self, x: f32) -> NaiveDate {
        let days = (x as f64 / self.pixels_per_day()).round() as i64;
        self.start + Duration::days(days)
    }

    /// Whole days represented by a horizontal pointer movement.
    pub fn delta_days(&self, delta_x: f32) -> i64 {
        (delta_x as f64 / self.pixels_per_day()).round() as i64
    }

    /// Total width in pixels of the visible range (inclusive of the last day).
    pub fn total_width(&self) -> f32 {
        self.date_to_offset(self.end + Duration::days(1))
    }

    /// Switch to a finer granularity.
    pub fn zoom_in(&mut self) {
        self.scale = match self.scale {
            TimelineScale::Month => TimelineScale::Week,
            _ => TimelineScale::Day,
        };
    }

    /// Switch to a coarser granularity.
    pub fn zoom_out(&mut self) {
        self.scale = match self.scale {
            TimelineScale::Day => TimelineScale::Week,
            _ => TimelineScale::Month,
        };
    }

    /// Dates at which header columns begin: every day, every Monday, or
    /// every first of the month depending on the scale.
    pub fn ticks(&self) -> Vec<NaiveDate> {
        let mut ticks = Vec::new();
        match self.scale {
            TimelineScale::Day => {
                let mut date = self.start;
                while date <= self.end {
                    ticks.push(date);
                    date += Duration::days(1);
                }
            }
            TimelineScale::Week => {
                let mut date = self.start;
                while date <= self.end {
                    ticks.push(date);
                    date += Duration::days(7);
                }
            }
            TimelineScale::Month => {
                let mut date = first_of_month(self.start);
                while date <= self.end {
                    ticks.push(date);
                    date = next_month(date);
                }
            }
        }
        ticks
    }
}

pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date) + Duration::days(6)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(date + Duration::days(31))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fit_floors_and_ceils_to_weeks() {
        // 2024-08-07 is a Wednesday, 2024-08-22 a Thursday.
        let tasks = vec![
            Task::new("A", d(2024, 8, 7), d(2024, 8, 12)),
            Task::new("B", d(2024, 8, 14), d(2024, 8, 22)),
        ];
        let tl = Timeline::fit(&tasks, TimelineScale::Day, d(2030, 1, 1));
        assert_eq!(tl.start, d(2024, 8, 5));
        assert_eq!(tl.end, d(2024, 8, 25));
    }

    #[test]
    fn empty_fit_is_four_weeks_from_today() {
        let today = d(2024, 8, 7);
        let tl = Timeline::fit(&[], TimelineScale::Week, today);
        assert_eq!(tl.start, d(2024, 8, 5));
        assert_eq!(tl.end, d(2024, 9, 1));
        assert_eq!((tl.end - tl.start).num_days() + 1, 28);
    }

    #[test]
    fn offsets_per_scale() {
        let mut tl = Timeline::fit(&[], TimelineScale::Day, d(2024, 8, 5));
        assert_eq!(tl.date_to_offset(d(2024, 8, 6)), 40.0);
        tl.scale = TimelineScale::Week;
        assert_eq!(tl.date_to_offset(d(2024, 8, 12)), 100.0);
        tl.scale = TimelineScale::Month;
        let x = tl.date_to_offset(d(2024, 8, 5) + Duration::days(61));
        assert!((x - 400.8).abs() < 0.5);
    }

    #[test]
    fn zoom_steps_through_scales() {
        let mut tl = Timeline::fit(&[], TimelineScale::Month, d(2024, 8, 5));
        tl.zoom_in();
        assert_eq!(tl.scale, TimelineScale::Week);
        tl.zoom_in();
        tl.zoom_in();
        assert_eq!(tl.scale, TimelineScale::Day);
        tl.zoom_out();
        tl.zoom_out();
        tl.zoom_out();
        assert_eq!(tl.scale, TimelineScale::Month);
    }

    #[test]
    fn month_ticks_land_on_first_days() {
        let tasks = vec![Task::new("A", d(2024, 7, 20), d(2024, 10, 2))];
        let tl = Timeline::fit(&tasks, TimelineScale::Month, d(2024, 1, 1));
        let ticks = tl.ticks();
        assert_eq!(ticks.first(), Some(&d(2024, 7, 1)));
        assert!(ticks.iter().all(|t| t.day() == 1));
        assert_eq!(ticks.last(), Some(&d(2024, 10, 1)));
    }

    fn scale_strategy() -> impl Strategy<Value = TimelineScale> {
        prop_oneof![
            Just(TimelineScale::Day),
            Just(TimelineScale::Week),
            Just(TimelineScale::Month),
        ]
    }

    proptest! {
        #[test]
        fn offset_round_trip(offset_days in 0i64..3000, scale in scale_strategy()) {
            let tl = Timeline::fit(&[], scale, d(2024, 1, 3));
            let date = tl.start + Duration::days(offset_days);
            let back = tl.offset_to_date(tl.date_to_offset(date));
            let drift = (back - date).num_days().abs();
            if scale == TimelineScale::Month {
                prop_assert!(drift <= 1);
            } else {
                prop_assert_eq!(drift, 0);
            }
        }
    }
}
