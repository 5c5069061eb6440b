pub mod graph;
pub mod interaction;
pub mod progress;
pub mod project;
pub mod resources;
pub mod store;
pub mod task;
pub mod timeline;
pub mod validation;

pub use graph::DependencyGraph;
pub use interaction::{DragMode, DragOutcome, Gesture, InteractionController};
pub use project::Project;
pub use resources::{Photo, Worker};
pub use store::TaskStore;
pub use task::{Task, TaskStatus};
pub use timeline::{Timeline, TimelineScale};
