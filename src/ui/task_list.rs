use egui::{Color32, Context, RichText, Ui, Window};
use egui_phosphor::regular as icons;

use crate::model::{EntityId, Project, Status, Task};
use crate::ui::board::status_badge;
use crate::ui::{theme, Action};

/// Render the task list window of one project.
pub fn show_task_list(project: &Project, open: &mut bool, ctx: &Context) -> Action {
    let mut action = Action::None;
    Window::new(RichText::new(format!("Tasks · {}", project.name)).strong().size(14.0))
        .id(egui::Id::new(("task-list", project.id)))
        .open(open)
        .resizable(true)
        .collapsible(false)
        .default_size([460.0, 380.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!(
                        "{} of {} done",
                        project.completed_tasks(),
                        project.tasks.len()
                    ))
                    .size(11.0)
                    .color(theme::TEXT_DIM),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if !project.tasks.is_empty() && add_task_button("Add task", ui) {
                        action = Action::NewTask(project.id);
                    }
                });
            });
            ui.add_space(4.0);
            ui.separator();

            if project.tasks.is_empty() {
                ui.add_space(24.0);
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("No tasks yet").color(theme::TEXT_DIM));
                    ui.add_space(6.0);
                    if add_task_button("Add first task", ui) {
                        action = Action::NewTask(project.id);
                    }
                });
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    action = action.or(show_task_rows(project, ui));
                });
        });
    action
}

/// One row per task with its status menu. Shared with the details window.
pub fn show_task_rows(project: &Project, ui: &mut Ui) -> Action {
    let mut action = Action::None;
    for (i, task) in project.tasks.iter().enumerate() {
        let row_bg = if i % 2 == 0 {
            theme::BG_PANEL
        } else {
            theme::BG_DARK
        };
        let frame = egui::Frame {
            fill: row_bg,
            rounding: egui::Rounding::same(4.0),
            inner_margin: egui::Margin::symmetric(6.0, 4.0),
            outer_margin: egui::Margin::ZERO,
            stroke: egui::Stroke::NONE,
            shadow: egui::epaint::Shadow::NONE,
        };
        frame.show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 6.0;
                ui.label(
                    RichText::new(theme::status_icon(task.status))
                        .color(theme::status_color(task.status)),
                );
                ui.vertical(|ui| {
                    ui.add(
                        egui::Label::new(RichText::new(&task.title).size(12.0).strong())
                            .truncate(),
                    );
                    ui.label(
                        RichText::new(format!(
                            "{} · due in {} day(s)",
                            task.responsible.code(),
                            task.due_days
                        ))
                        .size(10.5)
                        .color(theme::TEXT_SECONDARY),
                    );
                    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
                        ui.label(RichText::new(description).size(10.5).color(theme::TEXT_DIM));
                    }
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.menu_button(icons::DOTS_THREE_VERTICAL, |ui| {
                        action = action.or(task_menu(project.id, task, ui));
                    });
                    status_badge(task.status, ui);
                });
            });
        });
        ui.add_space(1.0);
    }
    action
}

fn task_menu(project_id: EntityId, task: &Task, ui: &mut Ui) -> Action {
    let mut action = Action::None;
    if ui.button(format!("{}  Edit task", icons::PENCIL_SIMPLE)).clicked() {
        action = Action::EditTask(project_id, task.id);
        ui.close_menu();
    }
    ui.menu_button(format!("{}  Set status", icons::ARROWS_LEFT_RIGHT), |ui| {
        for status in Status::ALL {
            let entry = ui.add_enabled(
                status != task.status,
                egui::Button::new(theme::status_text(status)),
            );
            if entry.clicked() {
                action = Action::SetTaskStatus {
                    project_id,
                    task_id: task.id,
                    status,
                };
                ui.close_menu();
            }
        }
    });
    ui.separator();
    let delete = RichText::new(format!("{}  Delete task", icons::TRASH)).color(theme::DANGER);
    if ui.button(delete).clicked() {
        action = Action::DeleteTask(project_id, task.id);
        ui.close_menu();
    }
    action
}

fn add_task_button(label: &str, ui: &mut Ui) -> bool {
    let btn = egui::Button::new(
        RichText::new(format!("{}  {label}", icons::PLUS))
            .color(Color32::WHITE)
            .size(12.0),
    )
    .fill(theme::ACCENT)
    .rounding(egui::Rounding::same(5.0));
    ui.add(btn).clicked()
}
