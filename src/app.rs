use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::config::AppSettings;
use crate::model::{DragOutcome, InteractionController, Photo, Project, Task, TaskStatus, TaskStore, Timeline, Worker};
use crate::ui;
use crate::ui::task_editor::EditorAction;
use crate::ui::task_table::TaskTableAction;

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Form-path editing copy of the selected task.
///
/// `base` is the stored version the edit started from; the draft is dirty
/// while `edit` differs from it.
#[derive(Debug, Clone, PartialEq)]
struct Draft {
    base: Task,
    edit: Task,
}

impl Draft {
    fn new(stored: &Task) -> Self {
        Self {
            base: stored.clone(),
            edit: stored.clone(),
        }
    }

    fn is_dirty(&self) -> bool {
        self.edit != self.base
    }

    /// Pull in changes made to the stored task outside the form.
    ///
    /// A clean draft is simply replaced. A dirty one keeps the user's field
    /// edits but takes the stored dates, links and photos, which only change
    /// through drags and the link/photo buttons.
    fn sync(&mut self, stored: &Task) {
        if !self.is_dirty() {
            if self.base != *stored {
                *self = Self::new(stored);
            }
            return;
        }
        for task in [&mut self.base, &mut self.edit] {
            task.start_date = stored.start_date;
            task.end_date = stored.end_date;
            task.depends_on = stored.depends_on.clone();
            task.photo_ids = stored.photo_ids.clone();
        }
    }
}

/// Main application state.
pub struct PlannerApp {
    pub project: Project,
    pub timeline: Timeline,
    pub controller: InteractionController,
    pub file_path: Option<PathBuf>,
    pub selected_task: Option<Uuid>,
    draft: Option<Draft>,

    pub settings: AppSettings,
    settings_path: PathBuf,

    // Dialog state
    pub show_add_task: bool,
    pub show_about: bool,
    pub show_csv_help: bool,
    pub show_crew: bool,
    pub new_task_name: String,
    pub new_task_start_date: NaiveDate,
    pub new_task_end_date: NaiveDate,
    pub new_worker_name: String,
    pub new_worker_trade: String,
    /// Message of the last rejected change, shown until dismissed.
    pub conflict: Option<String>,

    pub status_message: String,
}

impl PlannerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let settings_path = AppSettings::default_path();
        let settings = AppSettings::load(&settings_path);
        let today = today();

        let reopened = settings.last_project.as_ref().and_then(|path| {
            match crate::io::load_project(path) {
                Ok(project) => Some((project, path.clone())),
                Err(e) => {
                    log::warn!("could not reopen {}: {}", path.display(), e);
                    None
                }
            }
        });
        let (project, file_path, status_message) = match reopened {
            Some((project, path)) => {
                let msg = format!("Opened {}", path.display());
                (project, Some(path), msg)
            }
            None => (Self::sample_project(today), None, "Ready".to_string()),
        };

        Self {
            timeline: Timeline::fit(project.store.tasks(), settings.default_scale, today),
            project,
            controller: InteractionController::new(),
            file_path,
            selected_task: None,
            draft: None,
            settings,
            settings_path,
            show_add_task: false,
            show_about: false,
            show_csv_help: false,
            show_crew: false,
            new_task_name: String::new(),
            new_task_start_date: today,
            new_task_end_date: today + Duration::days(7),
            new_worker_name: String::new(),
            new_worker_trade: String::new(),
            conflict: None,
            status_message,
        }
    }

    /// A small residential build to show on first launch.
    fn sample_project(today: NaiveDate) -> Project {
        let mut project = Project::new("Sample Site");
        let day = |offset: i64| today + Duration::days(offset);

        let operator = Worker::new("Carlos Ruiz", "Excavator operator");
        let foreman = Worker::new("Marta Gómez", "Concrete foreman");
        let electrician = Worker::new("Jon Ellis", "Electrician");

        let mut prep = Task::new("Site preparation", day(-14), day(-10));
        prep.status = TaskStatus::Completed;
        prep.completion_date = Some(day(-10));
        prep.total_value = Some(4_000.0);

        let mut excavation = Task::new("Excavation", day(-9), day(-1));
        excavation.depends_on = vec![prep.id];
        excavation.total_volume = Some(120.0);
        excavation.completed_volume = Some(120.0);
        excavation.volume_unit = Some("m3".into());
        excavation.status = TaskStatus::Completed;
        excavation.completion_date = Some(day(-1));
        excavation.total_value = Some(9_500.0);
        excavation.assigned_worker_id = Some(operator.id);

        let mut foundations = Task::new("Foundations", day(0), day(10));
        foundations.depends_on = vec![excavation.id];
        foundations.total_volume = Some(45.0);
        foundations.completed_volume = Some(12.0);
        foundations.volume_unit = Some("m3".into());
        foundations.status = TaskStatus::InProgress;
        foundations.total_value = Some(18_000.0);
        foundations.assigned_worker_id = Some(foreman.id);

        let mut framing = Task::new("Framing", day(11), day(25));
        framing.depends_on = vec![foundations.id];
        framing.total_value = Some(22_000.0);

        let mut roofing = Task::new("Roofing", day(26), day(34));
        roofing.depends_on = vec![framing.id];
        roofing.total_value = Some(12_500.0);

        let mut rough_in = Task::new("Electrical rough-in", day(26), day(38));
        rough_in.depends_on = vec![framing.id];
        rough_in.total_value = Some(7_800.0);
        rough_in.assigned_worker_id = Some(electrician.id);

        let mut inspection = Task::new("Inspection", day(39), day(40));
        inspection.depends_on = vec![roofing.id, rough_in.id];

        project.store = TaskStore::from_tasks(vec![
            prep,
            excavation,
            foundations,
            framing,
            roofing,
            rough_in,
            inspection,
        ]);
        project.workers = vec![operator, foreman, electrician];
        project
    }

    // --- File operations ---

    pub fn new_project(&mut self) {
        self.project = Project::default();
        self.file_path = None;
        self.reset_selection();
        self.refit_timeline();
        self.status_message = "New project created".to_string();
    }

    pub fn open_project(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Site Project", &["site.json", "json"])
            .pick_file()
        {
            match crate::io::load_project(&path) {
                Ok(project) => {
                    self.project = project;
                    self.remember_project(path);
                    self.reset_selection();
                    self.refit_timeline();
                    self.status_message = "Project loaded".to_string();
                }
                Err(e) => {
                    self.status_message = format!("Error loading: {}", e);
                }
            }
        }
    }

    pub fn save_project(&mut self) {
        if let Some(path) = self.file_path.clone() {
            self.project.touch();
            match crate::io::save_project(&self.project, &path) {
                Ok(()) => self.status_message = "Project saved".to_string(),
                Err(e) => self.status_message = format!("Error saving: {}", e),
            }
        } else {
            self.save_project_as();
        }
    }

    pub fn save_project_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Site Project", &["site.json", "json"])
            .set_file_name(format!("{}.site.json", self.project.name))
            .save_file()
        {
            self.project.touch();
            match crate::io::save_project(&self.project, &path) {
                Ok(()) => {
                    self.remember_project(path);
                    self.status_message = "Project saved".to_string();
                }
                Err(e) => self.status_message = format!("Error saving: {}", e),
            }
        }
    }

    pub fn import_csv(&mut self) {
        if !self.project.store.is_empty() {
            let confirm = rfd::MessageDialog::new()
                .set_title("Import CSV")
                .set_description("This will replace the current project. Continue?")
                .set_buttons(rfd::MessageButtons::YesNo)
                .show();
            if confirm != rfd::MessageDialogResult::Yes {
                return;
            }
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv", "txt"])
            .pick_file()
        {
            match crate::io::csv_import::import_csv(&path, today()) {
                Ok((tasks, skipped)) => {
                    let proj_name = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("Imported Site")
                        .to_string();

                    let count = tasks.len();
                    self.project = Project::new(proj_name);
                    self.project.store.replace_all(tasks);
                    self.file_path = None;
                    self.reset_selection();
                    self.refit_timeline();

                    self.status_message = if skipped > 0 {
                        format!("Imported {} tasks ({} rows skipped)", count, skipped)
                    } else {
                        format!("Imported {} tasks", count)
                    };
                }
                Err(e) => {
                    log::error!("CSV import of {} failed: {}", path.display(), e);
                    self.status_message = format!("CSV import failed: {}", e);
                }
            }
        }
    }

    pub fn export_csv(&mut self) {
        if self.project.store.is_empty() {
            self.status_message = "Nothing to export, the project has no tasks".to_string();
            return;
        }

        let default_name = format!("{}.csv", self.project.name);
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(default_name)
            .save_file()
        {
            match crate::io::csv_export::export_csv(self.project.store.tasks(), &path) {
                Ok(count) => {
                    self.status_message = format!("Exported {} tasks to CSV", count);
                }
                Err(e) => {
                    self.status_message = format!("CSV export failed: {}", e);
                }
            }
        }
    }

    fn remember_project(&mut self, path: PathBuf) {
        self.settings.last_project = Some(path.clone());
        self.file_path = Some(path);
        self.save_settings();
    }

    fn save_settings(&mut self) {
        self.settings.default_scale = self.timeline.scale;
        if let Err(e) = self.settings.save(&self.settings_path) {
            log::warn!("could not save settings: {}", e);
        }
    }

    // --- Task operations ---

    pub fn create_task_from_dialog(&mut self) {
        let name = self.new_task_name.trim();
        let name = if name.is_empty() { "New Task" } else { name };
        let task = Task::new(name, self.new_task_start_date, self.new_task_end_date);

        match self.project.store.add_task(task, today()) {
            Ok(id) => {
                self.project.touch();
                self.selected_task = Some(id);
                self.refit_timeline();
                self.reset_dialog_fields();
                self.status_message = "Task added".to_string();
            }
            Err(e) => self.report_conflict(e.to_string()),
        }
    }

    pub fn delete_task(&mut self, id: Uuid) {
        if self.controller.active_task() == Some(id) {
            self.controller.abort();
        }
        let Some(removed) = self.project.store.remove_task(id) else {
            return;
        };
        // Photos nobody else references go with the task.
        let still_used = |photo: &Photo| {
            self.project
                .store
                .tasks()
                .iter()
                .any(|t| t.photo_ids.contains(&photo.id))
        };
        let orphaned: Vec<Uuid> = self
            .project
            .photos
            .iter()
            .filter(|p| removed.photo_ids.contains(&p.id) && !still_used(p))
            .map(|p| p.id)
            .collect();
        self.project.photos.retain(|p| !orphaned.contains(&p.id));

        if self.selected_task == Some(id) {
            self.reset_selection();
        }
        self.project.touch();
        self.refit_timeline();
        self.status_message = format!("Deleted '{}'", removed.name);
    }

    pub fn add_worker_from_dialog(&mut self) {
        let name = self.new_worker_name.trim();
        if name.is_empty() {
            return;
        }
        let worker = Worker::new(name, self.new_worker_trade.trim());
        self.status_message = format!("Added {}", worker.display_name());
        self.project.workers.push(worker);
        self.project.touch();
        self.new_worker_name.clear();
        self.new_worker_trade.clear();
    }

    pub fn remove_worker(&mut self, id: Uuid) {
        self.project.remove_worker(id);
        if let Some(draft) = &mut self.draft {
            for task in [&mut draft.base, &mut draft.edit] {
                if task.assigned_worker_id == Some(id) {
                    task.assigned_worker_id = None;
                }
            }
        }
        self.project.touch();
        self.status_message = "Worker removed".to_string();
    }

    pub fn refit_timeline(&mut self) {
        self.timeline.refit(self.project.store.tasks(), today());
    }

    fn reset_selection(&mut self) {
        self.selected_task = None;
        self.draft = None;
        self.controller.abort();
    }

    fn reset_dialog_fields(&mut self) {
        let today = today();
        self.new_task_name = String::new();
        self.new_task_start_date = today;
        self.new_task_end_date = today + Duration::days(7);
    }

    fn report_conflict(&mut self, message: String) {
        log::warn!("change rejected: {}", message);
        self.status_message = "Change rejected".to_string();
        self.conflict = Some(message);
    }

    /// Keep the draft pointed at the selected task and in step with the store.
    fn sync_draft(&mut self) {
        let Some(id) = self.selected_task else {
            self.draft = None;
            return;
        };
        let Some(stored) = self.project.store.get(id) else {
            self.selected_task = None;
            self.draft = None;
            return;
        };
        if let Some(draft) = self.draft.as_mut().filter(|d| d.base.id == id) {
            draft.sync(stored);
            return;
        }
        self.draft = Some(Draft::new(stored));
    }

    fn handle_editor_action(&mut self, action: EditorAction) {
        let Some(id) = self.selected_task else {
            return;
        };
        match action {
            EditorAction::None => {}
            EditorAction::Save => {
                let Some(draft) = &self.draft else {
                    return;
                };
                let proposed = draft.edit.clone();
                match self.project.store.update_task(proposed, today()) {
                    Ok(()) => {
                        self.project.touch();
                        self.draft = None;
                        self.refit_timeline();
                        self.status_message = "Task updated".to_string();
                    }
                    // The draft is kept so the user can fix it.
                    Err(e) => self.report_conflict(e.to_string()),
                }
            }
            EditorAction::Revert => {
                self.draft = None;
                self.status_message = "Changes discarded".to_string();
            }
            EditorAction::Delete => self.delete_task(id),
            EditorAction::AddDependency(pre) => {
                match self.project.store.add_dependency(id, pre) {
                    Ok(()) => {
                        self.project.touch();
                        self.status_message = "Dependency added".to_string();
                    }
                    Err(e) => self.report_conflict(e.to_string()),
                }
            }
            EditorAction::RemoveDependency(pre) => {
                if self.project.store.remove_dependency(id, pre) {
                    self.project.touch();
                    self.status_message = "Dependency removed".to_string();
                }
            }
            EditorAction::AttachPhoto => self.attach_photo(id),
            EditorAction::OpenPhoto(photo_id) => {
                if let Some(photo) = self.project.photo(photo_id) {
                    if let Err(e) = open::that(&photo.path) {
                        self.status_message = format!("Could not open photo: {}", e);
                    }
                }
            }
            EditorAction::DetachPhoto(photo_id) => {
                let Some(mut task) = self.project.store.get(id).cloned() else {
                    return;
                };
                task.photo_ids.retain(|p| *p != photo_id);
                match self.project.store.update_task(task, today()) {
                    Ok(()) => {
                        let used = self
                            .project
                            .store
                            .tasks()
                            .iter()
                            .any(|t| t.photo_ids.contains(&photo_id));
                        if !used {
                            self.project.photos.retain(|p| p.id != photo_id);
                        }
                        self.project.touch();
                        self.status_message = "Photo detached".to_string();
                    }
                    Err(e) => self.report_conflict(e.to_string()),
                }
            }
        }
    }

    fn attach_photo(&mut self, id: Uuid) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["jpg", "jpeg", "png", "heic", "webp"])
            .pick_file()
        else {
            return;
        };
        let Some(mut task) = self.project.store.get(id).cloned() else {
            return;
        };
        let photo = Photo::new(path, today());
        task.photo_ids.push(photo.id);
        match self.project.store.update_task(task, today()) {
            Ok(()) => {
                self.status_message = format!("Attached '{}'", photo.caption);
                self.project.photos.push(photo);
                self.project.touch();
            }
            Err(e) => self.report_conflict(e.to_string()),
        }
    }

    fn handle_drag_outcome(&mut self, outcome: DragOutcome) {
        match outcome {
            DragOutcome::Committed { task, start, end } => {
                self.project.touch();
                let name = self
                    .project
                    .store
                    .get(task)
                    .map(|t| t.name.clone())
                    .unwrap_or_default();
                self.status_message = format!(
                    "Updated '{}' ({} → {})",
                    name,
                    start.format("%Y-%m-%d"),
                    end.format("%Y-%m-%d")
                );
                self.refit_timeline();
            }
            DragOutcome::RolledBack { error, .. } => self.report_conflict(error.to_string()),
            DragOutcome::Unchanged { .. } | DragOutcome::Ignored => {}
        }
    }
}

impl eframe::App for PlannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let today = today();

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S)) {
            self.save_project();
        }
        if let Some(active) = self.controller.active_task() {
            if self.project.store.get(active).is_none() {
                self.controller.abort();
            }
        }
        self.sync_draft();

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        let summary = crate::model::progress::summarize(self.project.store.tasks());
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_STATUS_BAR)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_status())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "Progress: {:.0}%  ·  {}/{} done  ·  {} in progress  ·  {} delayed  ·  {}",
                                summary.earned * 100.0,
                                summary.completed,
                                summary.total,
                                summary.in_progress,
                                summary.delayed,
                                self.timeline.scale.label(),
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Left panel: editor + task table
        let mut task_action = TaskTableAction::None;
        let mut editor_action = EditorAction::None;
        let panel = egui::SidePanel::left("task_panel")
            .default_width(self.settings.side_panel_width)
            .min_width(240.0)
            .max_width(self.settings.side_panel_width * 2.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(8.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                if let Some(draft) = &mut self.draft {
                    let graph = self.project.store.graph();
                    egui::ScrollArea::vertical()
                        .id_salt("editor_scroll")
                        .max_height(ui.available_height() * 0.6)
                        .show(ui, |ui| {
                            editor_action = ui::task_editor::show_task_editor(
                                &mut draft.edit,
                                &draft.base,
                                &self.project,
                                &graph,
                                ui,
                            );
                        });
                    ui.add_space(4.0);
                    ui.separator();
                    ui.add_space(2.0);
                }

                task_action = ui::task_table::show_task_table(
                    &self.project,
                    self.selected_task,
                    today,
                    ui,
                );
            });
        self.settings.side_panel_width = panel.response.rect.width();

        self.handle_editor_action(editor_action);
        match task_action {
            TaskTableAction::Select(id) => self.selected_task = Some(id),
            TaskTableAction::Delete(id) => self.delete_task(id),
            TaskTableAction::Add => self.show_add_task = true,
            TaskTableAction::None => {}
        }

        // Central panel: Gantt chart
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        let chart = egui::CentralPanel::default()
            .frame(chart_frame)
            .show(ctx, |ui| {
                ui::gantt_chart::show_gantt_chart(
                    &mut self.project,
                    &mut self.timeline,
                    &mut self.controller,
                    &mut self.selected_task,
                    today,
                    ui,
                )
            });
        if let Some(outcome) = chart.inner.outcome {
            self.handle_drag_outcome(outcome);
        }

        // Dialogs
        if self.show_add_task {
            ui::dialogs::show_add_task_dialog(self, ctx);
        }
        if self.show_crew {
            ui::dialogs::show_crew_dialog(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
        if self.show_csv_help {
            ui::dialogs::show_csv_help_dialog(self, ctx);
        }
        if self.conflict.is_some() {
            ui::dialogs::show_conflict_dialog(self, ctx);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_settings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    #[test]
    fn clean_draft_follows_the_store() {
        let stored = Task::new("Backfill", d(5), d(8));
        let mut draft = Draft::new(&stored);

        let mut moved = stored.clone();
        moved.start_date = d(9);
        moved.end_date = d(12);
        draft.sync(&moved);
        assert_eq!(draft, Draft::new(&moved));
        assert!(!draft.is_dirty());
    }

    #[test]
    fn dirty_draft_keeps_edits_but_takes_committed_dates() {
        let stored = Task::new("Backfill", d(5), d(8));
        let mut draft = Draft::new(&stored);
        draft.edit.description = "Compact in 30 cm lifts".into();

        // A drag committed new dates while the form had unsaved notes.
        let mut moved = stored.clone();
        moved.start_date = d(9);
        moved.end_date = d(12);
        moved.photo_ids = vec![Uuid::new_v4()];
        draft.sync(&moved);

        assert!(draft.is_dirty());
        assert_eq!(draft.edit.description, "Compact in 30 cm lifts");
        assert_eq!((draft.edit.start_date, draft.edit.end_date), (d(9), d(12)));
        assert_eq!((draft.base.start_date, draft.base.end_date), (d(9), d(12)));
        assert_eq!(draft.edit.photo_ids, moved.photo_ids);

        // Saving the draft keeps the dragged dates.
        let mut store = TaskStore::from_tasks(vec![stored.clone()]);
        store.update_dates(stored.id, d(9), d(12)).unwrap();
        store.update_task(draft.edit.clone(), d(1)).unwrap();
        let saved = store.get(stored.id).unwrap();
        assert_eq!((saved.start_date, saved.end_date), (d(9), d(12)));
        assert_eq!(saved.description, "Compact in 30 cm lifts");
    }
}
