use egui::{Color32, Id, RichText, Ui};
use uuid::Uuid;

use crate::model::{DependencyGraph, Project, Task, TaskStatus};
use crate::ui::theme;

/// Actions the editor can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    /// Validate the draft and write it to the store.
    Save,
    /// Throw the draft away and reload from the store.
    Revert,
    Delete,
    AddDependency(Uuid),
    RemoveDependency(Uuid),
    AttachPhoto,
    OpenPhoto(Uuid),
    DetachPhoto(Uuid),
}

fn field_label(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(10.0).color(theme::TEXT_DIM).strong());
}

/// Edit an optional quantity; zero or less clears it.
fn optional_amount(ui: &mut Ui, value: &mut Option<f64>, suffix: &str) -> bool {
    let mut amount = value.unwrap_or(0.0);
    let resp = ui.add(
        egui::DragValue::new(&mut amount)
            .speed(1.0)
            .range(0.0..=f64::MAX)
            .suffix(suffix),
    );
    if resp.changed() {
        *value = (amount > 0.0).then_some(amount);
    }
    resp.changed()
}

/// Render the form editor for the selected task's draft.
///
/// Edits only touch `draft`. Nothing reaches the store until the caller
/// handles [`EditorAction::Save`], except links, which are validated on
/// their own.
pub fn show_task_editor(
    draft: &mut Task,
    saved: &Task,
    project: &Project,
    graph: &DependencyGraph,
    ui: &mut Ui,
) -> EditorAction {
    let mut action = EditorAction::None;
    let task_id = draft.id;
    let all_tasks = project.store.tasks();

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Edit Task")
                .strong()
                .size(13.0)
                .color(theme::TEXT_PRIMARY),
        );
        if draft != saved {
            ui.label(RichText::new("● unsaved").size(10.0).color(theme::CONNECTOR_ACTIVE));
        }
    });
    ui.add_space(4.0);

    let frame = egui::Frame {
        fill: theme::BG_DARK,
        rounding: egui::Rounding::same(6.0),
        inner_margin: egui::Margin::same(10.0),
        outer_margin: egui::Margin::ZERO,
        stroke: egui::Stroke::new(1.0, theme::BORDER_SUBTLE),
        shadow: egui::epaint::Shadow::NONE,
    };

    frame.show(ui, |ui| {
        ui.spacing_mut().item_spacing.y = 6.0;
        ui.visuals_mut().extreme_bg_color = theme::BG_FIELD;

        field_label(ui, "Name");
        ui.add_sized(
            [ui.available_width(), 24.0],
            egui::TextEdit::singleline(&mut draft.name)
                .font(egui::FontId::proportional(12.0))
                .text_color(theme::TEXT_PRIMARY),
        );

        field_label(ui, "Status");
        egui::ComboBox::from_id_salt("status_combo")
            .selected_text(
                RichText::new(draft.status.label())
                    .size(11.0)
                    .color(theme::status_color(draft.status)),
            )
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for status in TaskStatus::all() {
                    ui.selectable_value(&mut draft.status, *status, status.label());
                }
            });
        if let Some(date) = draft.completion_date {
            ui.label(
                RichText::new(format!("Completed on {}", date.format("%Y-%m-%d")))
                    .size(9.5)
                    .color(theme::TEXT_DIM),
            );
        }

        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                field_label(ui, "Start");
                let resp = ui.add(
                    egui_extras::DatePickerButton::new(&mut draft.start_date).id_salt("dp_start"),
                );
                if resp.changed() && draft.start_date > draft.end_date {
                    draft.end_date = draft.start_date;
                }
            });
            ui.add_space(8.0);
            ui.vertical(|ui| {
                field_label(ui, "End");
                let resp = ui.add(
                    egui_extras::DatePickerButton::new(&mut draft.end_date).id_salt("dp_end"),
                );
                if resp.changed() && draft.end_date < draft.start_date {
                    draft.start_date = draft.end_date;
                }
            });
        });
        ui.label(
            RichText::new(format!("{} days", draft.duration_days()))
                .size(9.5)
                .color(theme::TEXT_DIM),
        );

        field_label(ui, "Volume");
        ui.horizontal(|ui| {
            let unit = draft.volume_unit.clone().unwrap_or_default();
            let suffix = if unit.is_empty() { String::new() } else { format!(" {unit}") };
            optional_amount(ui, &mut draft.completed_volume, &suffix);
            ui.label(RichText::new("of").size(10.0).color(theme::TEXT_DIM));
            optional_amount(ui, &mut draft.total_volume, &suffix);

            let mut unit_edit = unit;
            let resp = ui.add(
                egui::TextEdit::singleline(&mut unit_edit)
                    .desired_width(40.0)
                    .hint_text("unit"),
            );
            if resp.changed() {
                let trimmed = unit_edit.trim();
                draft.volume_unit = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
        });
        if let Some(status) = draft.volume_status() {
            ui.label(
                RichText::new(format!("Volume marks this task {}", status.label().to_lowercase()))
                    .size(9.5)
                    .color(theme::TEXT_DIM),
            );
        }

        field_label(ui, "Value");
        optional_amount(ui, &mut draft.total_value, "");

        field_label(ui, "Assigned to");
        let worker_text = project.worker_label(draft.assigned_worker_id);
        egui::ComboBox::from_id_salt("worker_combo")
            .selected_text(RichText::new(worker_text).size(11.0))
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut draft.assigned_worker_id, None, "Unassigned");
                for worker in &project.workers {
                    ui.selectable_value(
                        &mut draft.assigned_worker_id,
                        Some(worker.id),
                        worker.display_name(),
                    );
                }
            });

        field_label(ui, "Notes");
        ui.add_sized(
            [ui.available_width(), 60.0],
            egui::TextEdit::multiline(&mut draft.description)
                .font(egui::FontId::proportional(11.0))
                .text_color(theme::TEXT_SECONDARY)
                .hint_text("Add notes or description..."),
        );

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let dirty = draft != saved;
            let save = egui::Button::new(
                RichText::new(format!("{}  Save", egui_phosphor::regular::FLOPPY_DISK))
                    .color(Color32::WHITE),
            )
            .fill(if dirty { theme::ACCENT } else { theme::BG_FIELD });
            if ui.add_enabled(dirty, save).clicked() {
                action = EditorAction::Save;
            }
            if ui.add_enabled(dirty, egui::Button::new("Revert")).clicked() {
                action = EditorAction::Revert;
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let del = egui::Button::new(
                    RichText::new(format!("{}  Delete", egui_phosphor::regular::TRASH))
                        .color(theme::DANGER),
                )
                .frame(false);
                if ui.add(del).clicked() {
                    action = EditorAction::Delete;
                }
            });
        });

        // ── Dependencies ─────────────────────────────────────────────
        ui.separator();
        field_label(ui, "Depends on");

        let name_of = |id: Uuid| {
            all_tasks
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| "?".to_string())
        };

        if saved.depends_on.is_empty() {
            ui.label(RichText::new("No prerequisites").size(9.5).color(theme::TEXT_DIM));
        }
        for pre in &saved.depends_on {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("{} {}", egui_phosphor::regular::ARROW_LEFT, name_of(*pre)))
                        .size(11.0)
                        .color(theme::TEXT_SECONDARY),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let del = ui.add(
                        egui::Button::new(
                            RichText::new(egui_phosphor::regular::X)
                                .size(9.0)
                                .color(theme::TEXT_DIM),
                        )
                        .frame(false),
                    );
                    if del.on_hover_text("Remove dependency").clicked() {
                        action = EditorAction::RemoveDependency(*pre);
                    }
                });
            });
        }

        let successors = graph.successors(task_id);
        if !successors.is_empty() {
            field_label(ui, "Blocks");
            for succ in successors {
                ui.label(
                    RichText::new(format!("{} {}", egui_phosphor::regular::ARROW_RIGHT, name_of(*succ)))
                        .size(11.0)
                        .color(theme::TEXT_SECONDARY),
                );
            }
        }

        // Candidates exclude self, existing links and anything that would close a loop.
        let candidates: Vec<(Uuid, String)> = all_tasks
            .iter()
            .filter(|t| {
                t.id != task_id
                    && !saved.depends_on(t.id)
                    && !graph.would_create_cycle(task_id, t.id)
            })
            .map(|t| (t.id, t.name.clone()))
            .collect();

        if !candidates.is_empty() {
            let picker_id = Id::new(("dep-picker", task_id));
            let mut target: Option<Uuid> =
                ui.ctx().data_mut(|d| d.get_temp(picker_id).unwrap_or_default());
            let target_label = target
                .and_then(|id| candidates.iter().find(|(cid, _)| *cid == id))
                .map(|(_, name)| name.clone())
                .unwrap_or_else(|| "Pick prerequisite".to_string());

            ui.horizontal(|ui| {
                let combo_w = (ui.available_width() - 30.0).clamp(60.0, 220.0);
                egui::ComboBox::from_id_salt("new-dep-target")
                    .selected_text(RichText::new(&target_label).size(11.0))
                    .width(combo_w)
                    .show_ui(ui, |ui| {
                        for (cid, cname) in &candidates {
                            if ui.selectable_label(target == Some(*cid), cname.as_str()).clicked() {
                                target = Some(*cid);
                            }
                        }
                    });

                let can_add = target.is_some();
                let btn = egui::Button::new(
                    RichText::new(egui_phosphor::regular::PLUS)
                        .size(13.0)
                        .color(Color32::WHITE),
                )
                .fill(if can_add { theme::ACCENT } else { theme::BG_FIELD })
                .rounding(egui::Rounding::same(4.0));
                if ui.add_enabled(can_add, btn).clicked() {
                    if let Some(pre) = target.take() {
                        action = EditorAction::AddDependency(pre);
                    }
                }
            });

            ui.ctx().data_mut(|d| d.insert_temp(picker_id, target));
        }

        // ── Photos ───────────────────────────────────────────────────
        ui.separator();
        ui.horizontal(|ui| {
            field_label(ui, "Photos");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let attach = ui.add(
                    egui::Button::new(RichText::new(egui_phosphor::regular::CAMERA).size(12.0))
                        .frame(false),
                );
                if attach.on_hover_text("Attach photo").clicked() {
                    action = EditorAction::AttachPhoto;
                }
            });
        });
        for photo_id in &saved.photo_ids {
            let photo_id = *photo_id;
            ui.horizontal(|ui| {
                match project.photo(photo_id) {
                    Some(photo) => {
                        let link = ui.link(RichText::new(&photo.caption).size(11.0));
                        if link
                            .on_hover_text(format!("{} · {}", photo.taken_on, photo.path.display()))
                            .clicked()
                        {
                            action = EditorAction::OpenPhoto(photo_id);
                        }
                    }
                    None => {
                        ui.label(
                            RichText::new(project.photo_label(photo_id))
                                .size(11.0)
                                .italics()
                                .color(theme::TEXT_DIM),
                        );
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let del = ui.add(
                        egui::Button::new(
                            RichText::new(egui_phosphor::regular::X)
                                .size(9.0)
                                .color(theme::TEXT_DIM),
                        )
                        .frame(false),
                    );
                    if del.on_hover_text("Detach photo").clicked() {
                        action = EditorAction::DetachPhoto(photo_id);
                    }
                });
            });
        }
    });

    action
}
