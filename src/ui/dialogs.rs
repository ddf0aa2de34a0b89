use chrono::NaiveDate;
use egui::{Color32, Context, RichText, Ui, Window};

use crate::error::ValidationFailed;
use crate::model::{EntityId, ProjectDraft, Responsible, Status, TaskDraft, Team};
use crate::ui::theme;

/// What a form dialog asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormResponse {
    None,
    Submit,
    Cancel,
}

/// Open project form: the draft being edited plus its inline errors.
#[derive(Debug, Clone)]
pub struct ProjectForm {
    pub draft: ProjectDraft,
    pub errors: ValidationFailed,
}

impl ProjectForm {
    pub fn new(draft: ProjectDraft) -> Self {
        Self {
            draft,
            errors: ValidationFailed::default(),
        }
    }
}

/// Open task form for `project_id`.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub project_id: EntityId,
    pub draft: TaskDraft,
    pub errors: ValidationFailed,
}

impl TaskForm {
    pub fn new(project_id: EntityId, draft: TaskDraft) -> Self {
        Self {
            project_id,
            draft,
            errors: ValidationFailed::default(),
        }
    }
}

/// Render the create/edit project dialog.
pub fn show_project_form(form: &mut ProjectForm, submitting: bool, ctx: &Context) -> FormResponse {
    let title = if form.draft.is_new() {
        "New Project"
    } else {
        "Edit Project"
    };
    let mut response = FormResponse::None;
    dialog_window(title).show(ctx, |ui| {
        field_grid("project_form_grid", ui, |ui| {
            let draft = &mut form.draft;
            let errors = &mut form.errors;

            ui.label(RichText::new("Name").color(theme::TEXT_SECONDARY));
            ui.vertical(|ui| {
                let edit = ui.add_sized(
                    [240.0, 24.0],
                    egui::TextEdit::singleline(&mut draft.name).hint_text("Project name..."),
                );
                if edit.changed() {
                    errors.clear_field("name");
                }
                field_error(errors, "name", ui);
            });
            ui.end_row();

            ui.label(RichText::new("Description").color(theme::TEXT_SECONDARY));
            ui.add_sized(
                [240.0, 56.0],
                egui::TextEdit::multiline(&mut draft.description).hint_text("Optional"),
            );
            ui.end_row();

            ui.label(RichText::new("Start").color(theme::TEXT_SECONDARY));
            if optional_date(ui, "project_start", &mut draft.start_date) {
                errors.clear_field("endDate");
            }
            ui.end_row();

            ui.label(RichText::new("End").color(theme::TEXT_SECONDARY));
            ui.vertical(|ui| {
                if optional_date(ui, "project_end", &mut draft.end_date) {
                    errors.clear_field("endDate");
                }
                field_error(errors, "endDate", ui);
            });
            ui.end_row();

            ui.label(RichText::new("Team").color(theme::TEXT_SECONDARY));
            egui::ComboBox::from_id_salt("project_team")
                .selected_text(draft.team_responsible.code())
                .show_ui(ui, |ui| {
                    for team in Team::ALL {
                        ui.selectable_value(&mut draft.team_responsible, team, team.code());
                    }
                });
            ui.end_row();

            ui.label(RichText::new("Status").color(theme::TEXT_SECONDARY));
            status_combo(ui, "project_status", &mut draft.status);
            ui.end_row();
        });
        let submit = if form.draft.is_new() { "Create" } else { "Update" };
        response = form_buttons(submit, submitting, ui);
    });
    escape_cancels(response, ctx)
}

/// Render the create/edit task dialog.
pub fn show_task_form(
    form: &mut TaskForm,
    project_name: &str,
    submitting: bool,
    ctx: &Context,
) -> FormResponse {
    let title = if form.draft.is_new() {
        "New Task"
    } else {
        "Edit Task"
    };
    let mut response = FormResponse::None;
    dialog_window(title).show(ctx, |ui| {
        ui.label(
            RichText::new(format!("Project: {project_name}"))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
        ui.add_space(4.0);
        field_grid("task_form_grid", ui, |ui| {
            let draft = &mut form.draft;
            let errors = &mut form.errors;

            ui.label(RichText::new("Title").color(theme::TEXT_SECONDARY));
            ui.vertical(|ui| {
                let edit = ui.add_sized(
                    [240.0, 24.0],
                    egui::TextEdit::singleline(&mut draft.title).hint_text("Task title..."),
                );
                if edit.changed() {
                    errors.clear_field("title");
                }
                field_error(errors, "title", ui);
            });
            ui.end_row();

            ui.label(RichText::new("Description").color(theme::TEXT_SECONDARY));
            ui.add_sized(
                [240.0, 56.0],
                egui::TextEdit::multiline(&mut draft.description).hint_text("Optional"),
            );
            ui.end_row();

            ui.label(RichText::new("Responsible").color(theme::TEXT_SECONDARY));
            egui::ComboBox::from_id_salt("task_responsible")
                .selected_text(draft.responsible.code())
                .show_ui(ui, |ui| {
                    for responsible in Responsible::ALL {
                        ui.selectable_value(&mut draft.responsible, responsible, responsible.code());
                    }
                });
            ui.end_row();

            ui.label(RichText::new("Due in (days)").color(theme::TEXT_SECONDARY));
            ui.vertical(|ui| {
                let drag = ui.add(egui::DragValue::new(&mut draft.due_days).range(0..=3650));
                if drag.changed() {
                    errors.clear_field("dueDays");
                }
                field_error(errors, "dueDays", ui);
            });
            ui.end_row();

            ui.label(RichText::new("Status").color(theme::TEXT_SECONDARY));
            status_combo(ui, "task_status", &mut draft.status);
            ui.end_row();
        });
        let submit = if form.draft.is_new() { "Create" } else { "Update" };
        response = form_buttons(submit, submitting, ui);
    });
    escape_cancels(response, ctx)
}

/// Render the "About" dialog. Returns `true` when it should close.
pub fn show_about_dialog(ctx: &Context) -> bool {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 180.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Kanban Board").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("Projects and tasks on a status board,");
                ui.label("built with Rust and egui.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape))
}

// ---- shared pieces ----

fn dialog_window(title: &str) -> Window<'static> {
    Window::new(RichText::new(title).strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([theme::DIALOG_WIDTH, 0.0])
}

fn field_grid(id: &str, ui: &mut Ui, add_contents: impl FnOnce(&mut Ui)) {
    // Force dark backgrounds inside this dialog
    ui.visuals_mut().extreme_bg_color = theme::BG_FIELD;
    ui.visuals_mut().striped = false;
    ui.add_space(4.0);
    egui::Grid::new(id)
        .num_columns(2)
        .striped(false)
        .spacing([12.0, 8.0])
        .show(ui, add_contents);
}

fn field_error(errors: &ValidationFailed, field: &str, ui: &mut Ui) {
    if let Some(message) = errors.message_for(field) {
        ui.label(RichText::new(message).size(10.5).color(theme::DANGER));
    }
}

fn status_combo(ui: &mut Ui, id: &str, status: &mut Status) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(theme::status_text(*status))
        .show_ui(ui, |ui| {
            for option in Status::ALL {
                ui.selectable_value(status, option, theme::status_text(option));
            }
        });
}

/// Checkbox plus date picker for an optional date. Returns `true` on change.
fn optional_date(ui: &mut Ui, id: &str, value: &mut Option<NaiveDate>) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        let mut enabled = value.is_some();
        if ui.checkbox(&mut enabled, "").changed() {
            *value = enabled.then(|| chrono::Local::now().date_naive());
            changed = true;
        }
        match value {
            Some(date) => {
                let picker = egui_extras::DatePickerButton::new(date).id_salt(id);
                changed |= ui.add(picker).changed();
            }
            None => {
                ui.label(RichText::new("Not set").color(theme::TEXT_DIM));
            }
        }
    });
    changed
}

fn form_buttons(submit: &str, submitting: bool, ui: &mut Ui) -> FormResponse {
    let mut response = FormResponse::None;
    ui.add_space(6.0);
    ui.separator();
    ui.add_space(4.0);
    ui.horizontal(|ui| {
        let label = if submitting { "Saving..." } else { submit };
        let submit_btn = egui::Button::new(RichText::new(label).color(Color32::WHITE))
            .fill(theme::ACCENT)
            .rounding(egui::Rounding::same(4.0));
        if ui
            .add_enabled_ui(!submitting, |ui| ui.add_sized([90.0, 28.0], submit_btn))
            .inner
            .clicked()
        {
            response = FormResponse::Submit;
        }
        if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
            response = FormResponse::Cancel;
        }
    });
    ui.add_space(2.0);
    response
}

fn escape_cancels(response: FormResponse, ctx: &Context) -> FormResponse {
    if response == FormResponse::None && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        FormResponse::Cancel
    } else {
        response
    }
}
