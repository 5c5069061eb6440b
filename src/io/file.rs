use std::path::Path;

use crate::error::FileError;
use crate::model::Project;

/// Save a project to a JSON file.
pub fn save_project(project: &Project, path: &Path) -> Result<(), FileError> {
    let json = serde_json::to_string_pretty(project)?;
    std::fs::write(path, json)?;
    log::info!("saved '{}' to {}", project.name, path.display());
    Ok(())
}

/// Load a project from a JSON file.
///
/// Task references are sanitized on the way in, so a hand-edited file with
/// stale dependency ids still loads.
pub fn load_project(path: &Path) -> Result<Project, FileError> {
    let json = std::fs::read_to_string(path)?;
    let mut project: Project = serde_json::from_str(&json)?;
    let tasks = project.store.list();
    project.store.replace_all(tasks);
    log::info!(
        "loaded '{}' ({} tasks) from {}",
        project.name,
        project.store.len(),
        path.display()
    );
    Ok(project)
}
