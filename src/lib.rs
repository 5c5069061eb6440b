//! Construction site scheduling with a dependency-aware Gantt chart.
//!
//! [`model`] holds the scheduling rules and has no UI types in it; [`ui`]
//! and [`app`] drive it from egui.

pub mod app;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod ui;
