use egui::{Context, RichText, Window};
use egui_phosphor::regular as icons;

use crate::model::project::format_date;
use crate::model::Project;
use crate::ui::board::status_badge;
use crate::ui::task_list::show_task_rows;
use crate::ui::{theme, Action};

/// Render the details window of one project.
pub fn show_project_details(project: &Project, open: &mut bool, ctx: &Context) -> Action {
    let mut action = Action::None;
    Window::new(RichText::new(&project.name).strong().size(14.0))
        .id(egui::Id::new(("project-details", project.id)))
        .open(open)
        .resizable(true)
        .collapsible(false)
        .default_size([480.0, 420.0])
        .show(ctx, |ui| {
            status_badge(project.status, ui);
            if !project.description.is_empty() {
                ui.add_space(4.0);
                ui.label(RichText::new(&project.description).color(theme::TEXT_SECONDARY));
            }
            ui.add_space(6.0);

            let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "Not set".to_string(), format_date);
            egui::Grid::new(("details_grid", project.id))
                .num_columns(2)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Start").color(theme::TEXT_DIM));
                    ui.label(date(project.start_date));
                    ui.end_row();

                    ui.label(RichText::new("End").color(theme::TEXT_DIM));
                    ui.label(date(project.end_date));
                    ui.end_row();

                    ui.label(RichText::new("Team").color(theme::TEXT_DIM));
                    ui.label(project.team_responsible.code());
                    ui.end_row();

                    ui.label(RichText::new("Progress").color(theme::TEXT_DIM));
                    ui.add(
                        egui::ProgressBar::new(f32::from(project.progress()) / 100.0)
                            .desired_width(180.0)
                            .text(format!(
                                "{}%  ({} of {})",
                                project.progress(),
                                project.completed_tasks(),
                                project.tasks.len()
                            )),
                    );
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui.button(format!("{}  Edit project", icons::PENCIL_SIMPLE)).clicked() {
                    action = Action::EditProject(project.id);
                }
                if ui.button(format!("{}  New task", icons::PLUS)).clicked() {
                    action = Action::NewTask(project.id);
                }
                let delete = RichText::new(format!("{}  Delete project", icons::TRASH))
                    .color(theme::DANGER);
                if ui.button(delete).clicked() {
                    action = Action::DeleteProject(project.id);
                }
            });

            ui.add_space(4.0);
            ui.separator();
            ui.label(RichText::new(format!("Tasks ({})", project.tasks.len())).strong());
            if project.tasks.is_empty() {
                ui.label(RichText::new("No tasks yet").color(theme::TEXT_DIM));
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
