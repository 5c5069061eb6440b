use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resources::{Photo, Worker};
use super::TaskStore;

/// A site project: the schedule plus the crew and photos it references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(rename = "tasks")]
    pub store: TaskStore,
    #[serde(default)]
    pub workers: Vec<Worker>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: "Untitled Site".to_string(),
            store: TaskStore::new(),
            workers: Vec::new(),
            photos: Vec::new(),
            created: Utc::now(),
            modified: Utc::now(),
        }
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    pub fn worker(&self, id: Option<Uuid>) -> Option<&Worker> {
        id.and_then(|id| self.workers.iter().find(|w| w.id == id))
    }

    /// Assigned worker's name, or "Unassigned" when missing.
    pub fn worker_label(&self, id: Option<Uuid>) -> String {
        self.worker(id)
            .map(Worker::display_name)
            .unwrap_or_else(|| "Unassigned".to_string())
    }

    pub fn photo(&self, id: Uuid) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    /// Caption for a photo link; a dangling id reads "missing photo".
    pub fn photo_label(&self, id: Uuid) -> String {
        self.photo(id)
            .map(|p| p.caption.clone())
            .unwrap_or_else(|| "missing photo".to_string())
    }

    /// Remove a worker and clear every assignment to them.
    pub fn remove_worker(&mut self, id: Uuid) {
        self.workers.retain(|w| w.id != id);
        self.store.unassign_worker(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;
    use chrono::NaiveDate;

    #[test]
    fn missing_references_degrade() {
        let mut project = Project::new("Warehouse");
        let crew = Worker::new("Ana", "Mason");
        let crew_id = crew.id;
        project.workers.push(crew);

        let day = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let mut task = Task::new("Block walls", day, day);
        task.assigned_worker_id = Some(crew_id);
        task.photo_ids.push(Uuid::new_v4());
        let id = project.store.add_task(task, day).unwrap();

        assert_eq!(project.worker_label(Some(crew_id)), "Ana (Mason)");
        project.remove_worker(crew_id);
        let task = project.store.get(id).unwrap();
        assert_eq!(task.assigned_worker_id, None);
        assert_eq!(project.worker_label(Some(crew_id)), "Unassigned");
        assert!(project.photo(task.photo_ids[0]).is_none());
        assert_eq!(project.photo_label(task.photo_ids[0]), "missing photo");

        let photo = Photo::new("site/pour.jpg".into(), day);
        let photo_id = photo.id;
        project.photos.push(photo);
        assert_eq!(project.photo_label(photo_id), "pour.jpg");
    }
}
