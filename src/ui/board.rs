use egui::{Color32, Id, LayerId, Order, Pos2, Rect, RichText, Sense, Stroke, Ui};
use egui_phosphor::regular as icons;

use crate::model::project::format_date;
use crate::model::{BoardColumns, EntityId, Project, Status};
use crate::ui::drag::{DragController, DragEnd, PointerKind};
use crate::ui::{theme, Action};

/// Render the four status columns and route card gestures through `drag`.
pub fn show_board(
    columns: &BoardColumns,
    selected: Option<EntityId>,
    drag: &mut DragController,
    ui: &mut Ui,
) -> Action {
    let mut action = Action::None;
    let mut column_rects: Vec<(Status, Rect)> = Vec::with_capacity(Status::ALL.len());
    let dragged = drag.dragging();
    let pointer = ui.input(|i| i.pointer.interact_pos());
    let kind = if ui.input(|i| i.any_touches()) {
        PointerKind::Touch
    } else {
        PointerKind::Mouse
    };

    let gaps = theme::COLUMN_GAP * (Status::ALL.len() - 1) as f32;
    let width = ((ui.available_width() - gaps) / Status::ALL.len() as f32)
        .max(theme::COLUMN_MIN_WIDTH);

    egui::ScrollArea::horizontal()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.horizontal_top(|ui| {
                ui.spacing_mut().item_spacing.x = theme::COLUMN_GAP;
                for column in &columns.columns {
                    let status = column.status;
                    let frame = egui::Frame::default()
                        .fill(theme::BG_COLUMN)
                        .rounding(egui::Rounding::same(theme::CARD_ROUNDING))
                        .inner_margin(egui::Margin::same(8.0));

                    let resp = frame.show(ui, |ui| {
                        ui.set_width(width - 16.0);
                        ui.set_min_height(ui.available_height());
                        action = action.or(column_header(status, column.projects.len(), ui));
                        ui.add_space(4.0);

                        egui::ScrollArea::vertical()
                            .id_salt(("column", status.code()))
                            .auto_shrink([false, false])
                            .show(ui, |ui| {
                                if column.projects.is_empty() {
                                    ui.add_space(12.0);
                                    ui.vertical_centered(|ui| {
                                        ui.label(
                                            RichText::new("No projects")
                                                .size(11.0)
                                                .color(theme::TEXT_DIM),
                                        );
                                    });
                                }
                                for project in &column.projects {
                                    let lifted = dragged.is_some_and(|(id, _)| id == project.id);
                                    let card = show_card(
                                        project,
                                        selected == Some(project.id),
                                        lifted,
                                        ui,
                                    );
                                    action = action.or(card.action);
                                    if card.response.is_pointer_button_down_on() && drag.is_idle() {
                                        let origin = ui
                                            .input(|i| i.pointer.press_origin())
                                            .or(pointer)
                                            .unwrap_or(card.response.rect.center());
                                        let now = ui.input(|i| i.time);
                                        drag.press(project.id, project.status, kind, origin, now);
                                    }
                                    if card.response.double_clicked() {
                                        action = Action::OpenDetails(project.id);
                                    }
                                    ui.add_space(6.0);
                                }
                            });
                    });

                    let rect = resp.response.rect;
                    if dragged.is_some() && pointer.is_some_and(|p| rect.contains(p)) {
                        ui.painter().rect(
                            rect,
                            theme::CARD_ROUNDING,
                            theme::BG_DROP_TARGET,
                            Stroke::new(1.5, theme::status_color(status)),
                        );
                    }
                    column_rects.push((status, rect));
                }
            });
        });

    if let Some((id, pos)) = dragged {
        if let Some(project) = columns
            .columns
            .iter()
            .flat_map(|c| c.projects.iter())
            .find(|p| p.id == id)
        {
            paint_ghost(project, pos, ui);
        }
    }

    action.or(track_gesture(drag, &column_rects, ui))
}

fn column_header(status: Status, count: usize, ui: &mut Ui) -> Action {
    let mut action = Action::None;
    ui.horizontal(|ui| {
        ui.label(
            RichText::new(theme::status_text(status))
                .font(theme::font_column_header())
                .color(theme::status_color(status))
                .strong(),
        );
        let badge = egui::Frame::default()
            .fill(theme::BG_CARD)
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::symmetric(6.0, 1.0));
        badge.show(ui, |ui| {
            ui.label(RichText::new(count.to_string()).size(10.5).color(theme::TEXT_SECONDARY));
        });
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let btn = egui::Button::new(RichText::new(icons::PLUS).size(12.0)).frame(false);
            if ui.add(btn).on_hover_text("Add project").clicked() {
                action = Action::NewProject(status);
            }
        });
    });
    action
}

struct Card {
    response: egui::Response,
    action: Action,
}

fn show_card(project: &Project, selected: bool, lifted: bool, ui: &mut Ui) -> Card {
    let mut action = Action::None;
    let stroke = if selected {
        Stroke::new(1.5, theme::BORDER_ACCENT)
    } else {
        Stroke::new(1.0, theme::BORDER_SUBTLE)
    };
    let frame = egui::Frame {
        fill: theme::BG_CARD,
        rounding: egui::Rounding::same(theme::CARD_ROUNDING),
        inner_margin: egui::Margin::same(8.0),
        outer_margin: egui::Margin::ZERO,
        stroke,
        shadow: egui::epaint::Shadow::NONE,
    };

    let frame_resp = frame.show(ui, |ui| {
        if lifted {
            ui.multiply_opacity(0.4);
        }
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.add(
                egui::Label::new(
                    RichText::new(&project.name)
                        .font(theme::font_card_title())
                        .strong(),
                )
                .truncate(),
            );
        });
        status_badge(project.status, ui);

        if !project.description.is_empty() {
            ui.add(
                egui::Label::new(
                    RichText::new(&project.description)
                        .size(11.0)
                        .color(theme::TEXT_SECONDARY),
                )
                .truncate(),
            );
        }

        ui.horizontal(|ui| {
            let start = project
                .start_date
                .map_or_else(|| "No start date".to_string(), format_date);
            ui.label(
                RichText::new(format!("{} {start}", icons::CALENDAR))
                    .font(theme::font_small())
                    .color(theme::TEXT_SECONDARY),
            );
            ui.label(
                RichText::new(format!("{} {}", icons::USERS, project.team_responsible.code()))
                    .font(theme::font_small())
                    .color(theme::TEXT_SECONDARY),
            );
        });

        let done = project.completed_tasks();
        let total = project.tasks.len();
        ui.add(
            egui::ProgressBar::new(f32::from(project.progress()) / 100.0)
                .desired_height(6.0)
                .fill(theme::status_color(Status::Finalizado)),
        );
        ui.label(
            RichText::new(format!("{done} of {total} tasks done"))
                .font(theme::font_small())
                .color(theme::TEXT_DIM),
        );
    });

    let response = ui.interact(
        frame_resp.response.rect,
        Id::new(("project-card", project.id)),
        Sense::click_and_drag(),
    );
    if response.hovered() && !lifted {
        ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::Grab);
    }
    response.context_menu(|ui| {
        if ui.button(format!("{}  Edit project", icons::PENCIL_SIMPLE)).clicked() {
            action = Action::EditProject(project.id);
            ui.close_menu();
        }
        if ui.button(format!("{}  Add task", icons::PLUS)).clicked() {
            action = Action::NewTask(project.id);
            ui.close_menu();
        }
        if ui.button(format!("{}  View tasks", icons::LIST_CHECKS)).clicked() {
            action = Action::ViewTasks(project.id);
            ui.close_menu();
        }
        ui.separator();
        let delete = RichText::new(format!("{}  Delete project", icons::TRASH)).color(theme::DANGER);
        if ui.button(delete).clicked() {
            action = Action::DeleteProject(project.id);
            ui.close_menu();
        }
    });

    // Kept outside the draggable rect so the click reaches the button.
    let add = egui::Button::new(
        RichText::new(format!("{} Add task", icons::PLUS))
            .size(10.5)
            .color(theme::TEXT_SECONDARY),
    )
    .frame(false);
    if ui.add(add).clicked() {
        action = Action::NewTask(project.id);
    }

    Card { response, action }
}

pub fn status_badge(status: Status, ui: &mut Ui) {
    let color = theme::status_color(status);
    egui::Frame::default()
        .fill(color.gamma_multiply(0.18))
        .rounding(egui::Rounding::same(4.0))
        .inner_margin(egui::Margin::symmetric(6.0, 1.0))
        .show(ui, |ui| {
            ui.label(RichText::new(theme::status_text(status)).size(10.5).color(color));
        });
}

fn paint_ghost(project: &Project, pos: Pos2, ui: &Ui) {
    let painter = ui
        .ctx()
        .layer_painter(LayerId::new(Order::Tooltip, Id::new("card-drag-ghost")));
    let rect = Rect::from_min_size(pos + egui::vec2(-20.0, -14.0), egui::vec2(200.0, 32.0));
    painter.rect(
        rect,
        theme::CARD_ROUNDING,
        theme::BG_CARD_HOVER,
        Stroke::new(1.5, theme::status_color(project.status)),
    );
    painter.text(
        rect.left_center() + egui::vec2(10.0, 0.0),
        egui::Align2::LEFT_CENTER,
        &project.name,
        theme::font_card_title(),
        Color32::WHITE,
    );
}

/// Advance the gesture with this frame's pointer state.
fn track_gesture(drag: &mut DragController, columns: &[(Status, Rect)], ui: &Ui) -> Action {
    if drag.is_idle() {
        return Action::None;
    }
    let (now, pointer, released, down) = ui.input(|i| {
        (
            i.time,
            i.pointer.interact_pos(),
            i.pointer.any_released(),
            i.pointer.any_down(),
        )
    });
    if let Some(pos) = pointer {
        drag.motion(pos, now);
    }
    drag.tick(now);

    if !released {
        if !down {
            // Release happened outside the window.
            drag.cancel();
        } else if drag.awaiting_activation() || drag.dragging().is_some() {
            ui.ctx().request_repaint();
        }
        return Action::None;
    }

    let target = pointer
        .and_then(|pos| columns.iter().find(|(_, rect)| rect.contains(pos)))
        .map(|(status, _)| status.code());
    match drag.release(target) {
        DragEnd::Click(id) => Action::SelectProject(id),
        DragEnd::Dropped(request) => Action::MoveProject(request),
        DragEnd::Ignored => Action::None,
    }
}
