use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use egui::{Color32, Pos2, Rect, Response, Rounding, Sense, Shape, Stroke, Ui, Vec2};
use uuid::Uuid;

use crate::model::{DragMode, DragOutcome, InteractionController, Project, Task, Timeline, TimelineScale};
use crate::ui::theme;

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const ROW_PADDING: f32 = theme::ROW_GAP;
const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// Result details from interactions in the Gantt chart.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    /// Set on the frame a gesture was released.
    pub outcome: Option<DragOutcome>,
}

/// Render the Gantt chart area (right panel).
///
/// Bars are drawn from the store, except the bar under an active gesture,
/// which follows the controller's preview until release.
pub fn show_gantt_chart(
    project: &mut Project,
    timeline: &mut Timeline,
    controller: &mut InteractionController,
    selected_task: &mut Option<Uuid>,
    today: NaiveDate,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let tasks = project.store.list();
    let graph = project.store.graph();
    let available = ui.available_size();
    let chart_width = timeline.total_width().max(available.x);
    let chart_height = HEADER_HEIGHT + (tasks.len() as f32 * (ROW_HEIGHT + ROW_PADDING)) + 40.0;

    // Ctrl+scroll steps between day, week and month columns, but not mid-gesture.
    if !controller.is_dragging()
        && ui.rect_contains_pointer(ui.max_rect())
        && ui.input(|i| i.modifiers.ctrl)
    {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll > 0.0 {
            timeline.zoom_in();
        } else if scroll < 0.0 {
            timeline.zoom_out();
        }
    }

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(chart_width, chart_height.max(available.y)),
                Sense::click(),
            );
            let origin = response.rect.min;
            let canvas_height = response.rect.height();
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

            // Alternating row backgrounds
            for i in 0..tasks.len() {
                let y = origin.y + HEADER_HEIGHT + i as f32 * (ROW_HEIGHT + ROW_PADDING);
                let row_bg = if i % 2 == 0 { theme::BG_PANEL } else { theme::BG_DARK };
                painter.rect_filled(
                    Rect::from_min_size(
                        Pos2::new(origin.x, y),
                        Vec2::new(chart_width, ROW_HEIGHT + ROW_PADDING),
                    ),
                    0.0,
                    row_bg,
                );
                painter.line_segment(
                    [
                        Pos2::new(origin.x, y + ROW_HEIGHT + ROW_PADDING),
                        Pos2::new(origin.x + chart_width, y + ROW_HEIGHT + ROW_PADDING),
                    ],
                    Stroke::new(0.5, theme::BORDER_SUBTLE),
                );
            }

            draw_timeline_header(&painter, origin, timeline, chart_width, canvas_height);
            draw_today_line(&painter, origin, timeline, today, canvas_height);

            // Bar rectangles, preview-aware, so connectors follow a dragged bar.
            let rects: HashMap<Uuid, Rect> = tasks
                .iter()
                .enumerate()
                .map(|(i, task)| {
                    let (start, end) = controller
                        .preview_for(task.id)
                        .unwrap_or((task.start_date, task.end_date));
                    (task.id, bar_rect(origin, timeline, start, end, i))
                })
                .collect();

            for (from, to) in graph.edges() {
                if let (Some(a), Some(b)) = (rects.get(&from), rects.get(&to)) {
                    let active = *selected_task == Some(from) || *selected_task == Some(to);
                    let color = if active { theme::CONNECTOR_ACTIVE } else { theme::CONNECTOR };
                    draw_connector(&painter, *a, *b, color);
                }
            }

            for task in &tasks {
                let Some(&rect) = rects.get(&task.id) else {
                    continue;
                };
                let is_selected = *selected_task == Some(task.id);
                let dragging = controller.active_task() == Some(task.id);
                draw_task_bar(&painter, rect, task, is_selected || dragging, today);

                let bar_response = ui.interact(
                    rect,
                    ui.make_persistent_id(("task-bar", task.id)),
                    Sense::click_and_drag(),
                );
                let left_handle_rect = Rect::from_min_max(
                    Pos2::new(rect.left() - HANDLE_WIDTH * 0.5, rect.top()),
                    Pos2::new(rect.left() + HANDLE_WIDTH * 0.5, rect.bottom()),
                );
                let right_handle_rect = Rect::from_min_max(
                    Pos2::new(rect.right() - HANDLE_WIDTH * 0.5, rect.top()),
                    Pos2::new(rect.right() + HANDLE_WIDTH * 0.5, rect.bottom()),
                );
                let left_response = ui.interact(
                    left_handle_rect.expand(4.0),
                    ui.make_persistent_id(("task-resize-left", task.id)),
                    Sense::drag(),
                );
                let right_response = ui.interact(
                    right_handle_rect.expand(4.0),
                    ui.make_persistent_id(("task-resize-right", task.id)),
                    Sense::drag(),
                );

                if bar_response.clicked() {
                    *selected_task = Some(task.id);
                    consumed_click = true;
                }

                for (resp, mode) in [
                    (&left_response, DragMode::ResizeStart),
                    (&right_response, DragMode::ResizeEnd),
                    (&bar_response, DragMode::Move),
                ] {
                    if let Some(outcome) =
                        handle_gesture(resp, mode, task.id, project, timeline, controller, ui)
                    {
                        interaction.outcome = Some(outcome);
                    }
                    if resp.drag_started() {
                        *selected_task = Some(task.id);
                        consumed_click = true;
                    }
                }

                let hovering_handle = left_response.hovered() || right_response.hovered();
                if hovering_handle {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                } else if bar_response.hovered() && !controller.is_dragging() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }

                // Rounded pill handles
                if is_selected || hovering_handle {
                    let handle_h = rect.height() * 0.55;
                    let handle_y = rect.center().y - handle_h / 2.0;
                    let lh = Rect::from_min_size(
                        Pos2::new(rect.left() - 1.5, handle_y),
                        Vec2::new(4.0, handle_h),
                    );
                    let rh = Rect::from_min_size(
                        Pos2::new(rect.right() - 2.5, handle_y),
                        Vec2::new(4.0, handle_h),
                    );
                    painter.rect_filled(lh, Rounding::same(2.0), theme::HANDLE_COLOR);
                    painter.rect_filled(rh, Rounding::same(2.0), theme::HANDLE_COLOR);
                }

                if let Some((start, end)) = controller.preview_for(task.id) {
                    egui::show_tooltip_at_pointer(
                        ui.ctx(),
                        ui.layer_id(),
                        egui::Id::new(("drag-tip", task.id)),
                        |ui| {
                            ui.strong(&task.name);
                            ui.label(format_range(start, end));
                        },
                    );
                } else if bar_response.hovered() || hovering_handle {
                    let worker = project.worker_label(task.assigned_worker_id);
                    egui::show_tooltip_at_pointer(
                        ui.ctx(),
                        ui.layer_id(),
                        egui::Id::new(("task-tip", task.id)),
                        |ui| {
                            ui.strong(&task.name);
                            ui.label(format_range(task.start_date, task.end_date));
                            ui.label(format!(
                                "{} · {}%",
                                task.status,
                                (task.progress_ratio() * 100.0).round() as i32
                            ));
                            ui.label(worker);
                        },
                    );
                }
            }

            // Empty click on background clears selection
            if response.clicked() && !consumed_click {
                *selected_task = None;
            }
        });

    interaction
}

/// Feed one handle's pointer events into the controller.
fn handle_gesture(
    resp: &Response,
    mode: DragMode,
    task: Uuid,
    project: &mut Project,
    timeline: &Timeline,
    controller: &mut InteractionController,
    ui: &Ui,
) -> Option<DragOutcome> {
    let pointer_x = resp.interact_pointer_pos().map(|p| p.x);

    if resp.drag_started() {
        if let Some(x) = pointer_x {
            controller.begin(&project.store, timeline, task, mode, x);
        }
    }
    if controller.active_task() != Some(task) {
        return None;
    }
    if resp.dragged() {
        ui.ctx().set_cursor_icon(match mode {
            DragMode::Move => egui::CursorIcon::Grabbing,
            _ => egui::CursorIcon::ResizeHorizontal,
        });
        if let Some(x) = pointer_x {
            controller.update(x);
        }
    }
    if resp.drag_stopped() {
        let x = pointer_x
            .or_else(|| ui.ctx().pointer_latest_pos().map(|p| p.x))
            .or_else(|| controller.last_x())?;
        return Some(controller.release(x, &mut project.store));
    }
    None
}

fn format_range(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{} → {}  ({} days)",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        (end - start).num_days() + 1
    )
}

/// Screen rectangle of a bar covering `start..=end` in row `row`.
fn bar_rect(origin: Pos2, timeline: &Timeline, start: NaiveDate, end: NaiveDate, row: usize) -> Rect {
    let y = origin.y + HEADER_HEIGHT + row as f32 * (ROW_HEIGHT + ROW_PADDING) + ROW_PADDING;
    let x_start = origin.x + timeline.date_to_offset(start);
    let x_end = origin.x + timeline.date_to_offset(end + Duration::days(1));
    let inset = theme::BAR_INSET;
    Rect::from_min_size(
        Pos2::new(x_start, y + inset),
        Vec2::new((x_end - x_start).max(6.0), ROW_HEIGHT - inset * 2.0),
    )
}

fn draw_timeline_header(
    painter: &egui::Painter,
    origin: Pos2,
    timeline: &Timeline,
    width: f32,
    height: f32,
) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    for date in timeline.ticks() {
        let x = origin.x + timeline.date_to_offset(date);
        painter.line_segment(
            [
                Pos2::new(x, origin.y + HEADER_HEIGHT),
                Pos2::new(x, origin.y + height),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );

        let (top, sub) = match timeline.scale {
            TimelineScale::Day => {
                let top = (date.day() == 1 || date == timeline.start)
                    .then(|| date.format("%b %Y").to_string());
                (top, Some(date.format("%d").to_string()))
            }
            TimelineScale::Week => {
                let top = (date.day() <= 7).then(|| date.format("%b %Y").to_string());
                (top, Some(date.format("W%V").to_string()))
            }
            TimelineScale::Month => (Some(date.format("%b %Y").to_string()), None),
        };

        if let Some(text) = top {
            painter.text(
                Pos2::new(x + 3.0, origin.y + 12.0),
                egui::Align2::LEFT_CENTER,
                text,
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
        }
        if let Some(text) = sub {
            let weekend = timeline.scale == TimelineScale::Day
                && date.weekday().num_days_from_monday() >= 5;
            painter.text(
                Pos2::new(x + 3.0, origin.y + 30.0),
                egui::Align2::LEFT_CENTER,
                text,
                theme::font_sub(),
                if weekend { theme::TEXT_DIM } else { theme::TEXT_SECONDARY },
            );
        }
    }
}

fn draw_today_line(
    painter: &egui::Painter,
    origin: Pos2,
    timeline: &Timeline,
    today: NaiveDate,
    height: f32,
) {
    if today < timeline.start || today > timeline.end {
        return;
    }
    let x = origin.x + timeline.date_to_offset(today);

    painter.line_segment(
        [
            Pos2::new(x, origin.y + HEADER_HEIGHT),
            Pos2::new(x, origin.y + height),
        ],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, origin.y + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}

/// Elbow connector from the end of `from` to the start of `to`.
fn draw_connector(painter: &egui::Painter, from: Rect, to: Rect, color: Color32) {
    let stroke = Stroke::new(1.2, color);
    let start = from.right_center();
    let end = to.left_center();
    let out_x = start.x + 8.0;

    let points = if end.x - 8.0 >= out_x {
        vec![start, Pos2::new(out_x, start.y), Pos2::new(out_x, end.y), end]
    } else {
        // Target starts behind the source: route around between the rows.
        let lane_y = if end.y > start.y {
            from.bottom() + ROW_PADDING + theme::BAR_INSET
        } else {
            from.top() - ROW_PADDING - theme::BAR_INSET
        };
        vec![
            start,
            Pos2::new(out_x, start.y),
            Pos2::new(out_x, lane_y),
            Pos2::new(end.x - 8.0, lane_y),
            Pos2::new(end.x - 8.0, end.y),
            end,
        ]
    };
    painter.add(Shape::line(points, stroke));

    let head = vec![
        end,
        end + Vec2::new(-6.0, -4.0),
        end + Vec2::new(-6.0, 4.0),
    ];
    painter.add(Shape::convex_polygon(head, color, Stroke::NONE));
}

fn draw_task_bar(painter: &egui::Painter, bar_rect: Rect, task: &Task, highlighted: bool, today: NaiveDate) {
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    let bar_width = bar_rect.width();
    let color = theme::status_color(task.status);

    // Soft shadow
    painter.rect_filled(
        bar_rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );
    painter.rect_filled(bar_rect, rounding, color);

    // Lighter top highlight
    let highlight_rect = Rect::from_min_size(
        bar_rect.min,
        Vec2::new(bar_width, (bar_rect.height() * 0.45).max(4.0)),
    );
    painter.rect_filled(
        highlight_rect,
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );

    // Progress fill (darkened overlay)
    let progress = task.progress_ratio() as f32;
    if progress > 0.0 {
        let progress_width = bar_width * progress;
        let progress_rect =
            Rect::from_min_size(bar_rect.min, Vec2::new(progress_width, bar_rect.height()));
        painter.rect_filled(progress_rect, rounding, theme::PROGRESS_OVERLAY);

        if progress < 0.98 {
            let tick_x = bar_rect.left() + progress_width;
            painter.line_segment(
                [
                    Pos2::new(tick_x, bar_rect.top() + 2.0),
                    Pos2::new(tick_x, bar_rect.bottom() - 2.0),
                ],
                Stroke::new(1.0, Color32::from_white_alpha(60)),
            );
        }
    }

    if task.is_overdue(today) {
        painter.rect_stroke(bar_rect, rounding, Stroke::new(1.5, theme::DANGER));
    }
    if highlighted {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    // Task name on bar (single line, clipped to bar bounds)
    if bar_width > 30.0 {
        let galley = painter.layout_no_wrap(task.name.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
        let clipped = painter.with_clip_rect(bar_rect);
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        clipped.galley(
            Pos2::new(bar_rect.left() + 6.0, text_y),
            galley,
            Color32::TRANSPARENT,
        );
    }
}
