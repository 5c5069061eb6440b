use egui::{Color32, Context, RichText, Window};

use crate::app::PlannerApp;
use crate::ui::theme;

/// Render the "Add Task" dialog.
pub fn show_add_task_dialog(app: &mut PlannerApp, ctx: &Context) {
    let mut should_close = false;
    Window::new(RichText::new("Add Task").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([320.0, 0.0])
        .show(ctx, |ui| {
            ui.visuals_mut().extreme_bg_color = theme::BG_FIELD;
            ui.visuals_mut().faint_bg_color = Color32::TRANSPARENT;
            ui.add_space(4.0);

            egui::Grid::new("add_task_grid")
                .num_columns(2)
                .striped(false)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Name").color(theme::TEXT_SECONDARY));
                    ui.add_sized(
                        [220.0, 24.0],
                        egui::TextEdit::singleline(&mut app.new_task_name)
                            .hint_text("Task name...")
                            .text_color(theme::TEXT_PRIMARY),
                    );
                    ui.end_row();

                    ui.label(RichText::new("Start").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui_extras::DatePickerButton::new(&mut app.new_task_start_date)
                            .id_salt("dlg_dp_start"),
                    );
                    ui.end_row();

                    ui.label(RichText::new("End").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui_extras::DatePickerButton::new(&mut app.new_task_end_date)
                            .id_salt("dlg_dp_end"),
                    );
                    ui.end_row();
                });

            if app.new_task_end_date < app.new_task_start_date {
                ui.label(
                    RichText::new("End is before start; the dates will be swapped.")
                        .size(10.0)
                        .color(theme::TEXT_DIM),
                );
            }

            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let can_create = !app.new_task_name.trim().is_empty();
                let create_btn = egui::Button::new(RichText::new("Create").color(Color32::WHITE))
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_enabled(can_create, create_btn).clicked() {
                    app.create_task_from_dialog();
                    should_close = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    should_close = true;
                }
            });
            ui.add_space(2.0);
        });

    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_add_task = false;
    }
}

/// Render the crew dialog: add and remove workers.
pub fn show_crew_dialog(app: &mut PlannerApp, ctx: &Context) {
    let mut should_close = false;
    let mut remove = None;
    Window::new(RichText::new("Crew").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([360.0, 0.0])
        .show(ctx, |ui| {
            ui.visuals_mut().extreme_bg_color = theme::BG_FIELD;

            if app.project.workers.is_empty() {
                ui.label(RichText::new("No workers yet").color(theme::TEXT_DIM));
            }
            egui::Grid::new("crew_grid")
                .num_columns(3)
                .striped(true)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    for worker in &app.project.workers {
                        let assigned = app
                            .project
                            .store
                            .tasks()
                            .iter()
                            .filter(|t| t.assigned_worker_id == Some(worker.id))
                            .count();
                        ui.label(RichText::new(&worker.name).strong());
                        ui.label(
                            RichText::new(format!("{} · {} tasks", worker.trade, assigned))
                                .color(theme::TEXT_SECONDARY),
                        );
                        let del = egui::Button::new(
                            RichText::new(egui_phosphor::regular::TRASH).color(theme::TEXT_DIM),
                        )
                        .frame(false);
                        if ui.add(del).on_hover_text("Remove worker").clicked() {
                            remove = Some(worker.id);
                        }
                        ui.end_row();
                    }
                });

            ui.add_space(6.0);
            ui.separator();
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut app.new_worker_name)
                        .hint_text("Name")
                        .desired_width(130.0),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut app.new_worker_trade)
                        .hint_text("Trade")
                        .desired_width(110.0),
                );
                let can_add = !app.new_worker_name.trim().is_empty();
                let btn = egui::Button::new(
                    RichText::new(egui_phosphor::regular::PLUS).color(Color32::WHITE),
                )
                .fill(theme::ACCENT);
                if ui.add_enabled(can_add, btn).clicked() {
                    app.add_worker_from_dialog();
                }
            });

            ui.add_space(6.0);
            if ui.add_sized([80.0, 28.0], egui::Button::new("Close")).clicked() {
                should_close = true;
            }
        });

    if let Some(id) = remove {
        app.remove_worker(id);
    }
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_crew = false;
    }
}

/// Render the scheduling conflict notice.
pub fn show_conflict_dialog(app: &mut PlannerApp, ctx: &Context) {
    let Some(message) = app.conflict.clone() else {
        return;
    };
    let mut should_close = false;
    Window::new(
        RichText::new(format!("{}  Scheduling conflict", egui_phosphor::regular::WARNING))
            .strong()
            .size(14.0)
            .color(theme::DANGER),
    )
    .resizable(false)
    .collapsible(false)
    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
    .fixed_size([360.0, 0.0])
    .show(ctx, |ui| {
        ui.add_space(4.0);
        ui.label(RichText::new(message).color(theme::TEXT_PRIMARY));
        ui.add_space(8.0);
        ui.label(
            RichText::new("No changes were saved.")
                .size(10.0)
                .color(theme::TEXT_DIM),
        );
        ui.add_space(6.0);
        if ui.add_sized([80.0, 28.0], egui::Button::new("OK")).clicked() {
            should_close = true;
        }
    });

    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.conflict = None;
    }
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut PlannerApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 180.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Site Planner").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("Construction scheduling with");
                ui.label("a dependency-aware Gantt chart.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}

/// Render the "CSV Import Format" help dialog.
pub fn show_csv_help_dialog(app: &mut PlannerApp, ctx: &Context) {
    let mut should_close = false;

    Window::new(RichText::new("CSV Import Format").strong().size(14.0))
        .resizable(true)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_size([560.0, 500.0])
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(4.0);
                ui.label(RichText::new("Delimiters").strong());
                ui.label("The delimiter is auto-detected: comma (,), semicolon (;), or tab.");
                ui.add_space(8.0);

                ui.label(RichText::new("Required Columns").strong());
                ui.add_space(2.0);
                egui::Grid::new("csv_required")
                    .num_columns(2)
                    .striped(true)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Column").underline());
                        ui.label(RichText::new("Accepted headers (case-insensitive)").underline());
                        ui.end_row();

                        ui.label(RichText::new("Task Name").strong());
                        ui.label("Name, Task, Title, Activity, Tarea, Nombre");
                        ui.end_row();

                        ui.label(RichText::new("Start Date").strong());
                        ui.label("Start, Start Date, From, Begin, Inicio, Fecha Inicio");
                        ui.end_row();

                        ui.label(RichText::new("End Date").strong());
                        ui.label("End, End Date, To, Finish, Due, Fin, Fecha Fin");
                        ui.end_row();
                    });
                ui.add_space(8.0);

                ui.label(RichText::new("Optional Columns").strong());
                ui.add_space(2.0);
                egui::Grid::new("csv_optional")
                    .num_columns(3)
                    .striped(true)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Column").underline());
                        ui.label(RichText::new("Accepted headers").underline());
                        ui.label(RichText::new("Accepted values").underline());
                        ui.end_row();

                        ui.label(RichText::new("Status").strong());
                        ui.label("Status, State, Stage, Estado");
                        ui.label("Not Started / In Progress / Completed / Delayed");
                        ui.end_row();

                        ui.label(RichText::new("Depends On").strong());
                        ui.label("Depends On, Predecessors, Prerequisites, After");
                        ui.label("Task names separated by |");
                        ui.end_row();

                        ui.label(RichText::new("Volume").strong());
                        ui.label("Total Volume, Completed Volume, Unit");
                        ui.label("Numbers, decimal comma accepted");
                        ui.end_row();

                        ui.label(RichText::new("Value").strong());
                        ui.label("Value, Total Value, Cost, Budget");
                        ui.label("Number");
                        ui.end_row();

                        ui.label(RichText::new("Description").strong());
                        ui.label("Description, Notes, Note, Details");
                        ui.label("Any text");
                        ui.end_row();
                    });
                ui.add_space(8.0);

                ui.label(RichText::new("Supported Date Formats").strong());
                ui.add_space(2.0);
                for fmt in &[
                    "YYYY-MM-DD   (e.g. 2025-06-15)",
                    "DD/MM/YYYY   (e.g. 15/06/2025)",
                    "MM/DD/YYYY   (e.g. 06/15/2025)",
                    "DD-MM-YYYY   (e.g. 15-06-2025)",
                    "DD.MM.YYYY   (e.g. 15.06.2025)",
                    "YYYY/MM/DD   (e.g. 2025/06/15)",
                ] {
                    ui.label(RichText::new(*fmt).monospace().size(11.0));
                }
                ui.add_space(8.0);

                ui.label(RichText::new("Notes").strong());
                ui.add_space(2.0);
                let notes = [
                    "• Header matching is case-insensitive and ignores spaces, hyphens and underscores.",
                    "• Prerequisites are matched by name and must appear in the same file.",
                    "• A link whose prerequisite ends after the task starts is dropped.",
                    "• Recorded volumes override the status column.",
                    "• Rows with a missing name or invalid dates are skipped.",
                ];
                for note in &notes {
                    ui.label(RichText::new(*note).small());
                }
                ui.add_space(10.0);

                ui.label(RichText::new("Minimal Example (semicolon-delimited)").strong());
                ui.add_space(2.0);
                let example = "Task;Start Date;End Date;Status;Depends On;Total Volume;Completed Volume;Unit\n\
                               Excavation;01/07/2025;08/07/2025;Completed;;120;120;m3\n\
                               Foundations;08/07/2025;20/07/2025;In Progress;Excavation;40;12;m3\n\
                               Framing;21/07/2025;15/08/2025;Not Started;Foundations;;;";
                egui::Frame::dark_canvas(ui.style()).show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut example.to_string())
                            .font(egui::TextStyle::Monospace)
                            .desired_width(f32::INFINITY)
                            .interactive(false),
                    );
                });
                ui.add_space(8.0);
            });

            ui.separator();
            ui.add_space(4.0);
            if ui.add_sized([80.0, 28.0], egui::Button::new("Close")).clicked() {
                should_close = true;
            }
            ui.add_space(2.0);
        });

    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_csv_help = false;
    }
}
