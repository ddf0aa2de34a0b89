use crate::config::{Settings, SettingsFile};
use crate::error::Operation;
use crate::model::{
    BoardView, EntityId, EntityStore, ProjectDraft, ProjectFilter, ProjectFocus, TaskDraft,
};
use crate::sync::{EntityKey, EntityKind, MutationEngine, Outcome};
use crate::ui;
use crate::ui::dialogs::{FormResponse, ProjectForm, TaskForm};
use crate::ui::drag::DragController;
use crate::ui::toasts::Toasts;
use crate::ui::Action;

/// Main application state.
pub struct BoardApp {
    store: EntityStore,
    engine: MutationEngine,
    view: BoardView,
    filter: ProjectFilter,
    settings: Settings,
    settings_file: SettingsFile,
    drag: DragController,
    selected_project: Option<EntityId>,

    // Windows
    details: Option<ProjectFocus>,
    task_list: Option<ProjectFocus>,
    project_form: Option<ProjectForm>,
    task_form: Option<TaskForm>,
    show_about: bool,

    // Notifications
    toasts: Toasts,
    status_message: String,
    loaded_once: bool,
}

impl BoardApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        engine: MutationEngine,
        settings_file: SettingsFile,
        settings: Settings,
    ) -> Self {
        ui::theme::install_fonts(&cc.egui_ctx);
        ui::theme::apply_theme(&cc.egui_ctx);

        let ctx = cc.egui_ctx.clone();
        let mut engine = engine.with_notify(std::sync::Arc::new(move || ctx.request_repaint()));
        let mut store = EntityStore::new();
        let ctx = cc.egui_ctx.clone();
        store.subscribe(move |snapshot| {
            tracing::trace!(projects = snapshot.len(), "Board snapshot changed");
            ctx.request_repaint();
        });
        engine.load();

        Self {
            store,
            engine,
            view: BoardView::default(),
            filter: settings.filters.clone(),
            settings,
            settings_file,
            drag: DragController::default(),
            selected_project: None,
            details: None,
            task_list: None,
            project_form: None,
            task_form: None,
            show_about: false,
            toasts: Toasts::default(),
            status_message: "Loading projects...".to_string(),
            loaded_once: false,
        }
    }

    // --- Actions ---

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Refresh => self.engine.load(),
            Action::SearchChanged => self.engine.search(&self.filter.search),
            Action::FiltersChanged => self.persist_filters(),
            Action::ShowAbout => self.show_about = true,
            Action::SelectProject(id) => self.selected_project = Some(id),
            Action::OpenDetails(id) => self.details = Some(ProjectFocus::new(id)),
            Action::ViewTasks(id) => self.task_list = Some(ProjectFocus::new(id)),
            Action::NewProject(status) => {
                self.project_form = Some(ProjectForm::new(ProjectDraft::new(status)));
            }
            Action::EditProject(id) => {
                if let Some(project) = self.store.snapshot().project(id) {
                    self.project_form = Some(ProjectForm::new(ProjectDraft::from_project(project)));
                }
            }
            Action::MoveProject(request) => {
                self.engine
                    .update_project_status(&mut self.store, request.project_id, request.to);
            }
            Action::DeleteProject(id) => {
                let name = self.project_name(id);
                if confirm("Delete project", &format!("Delete project '{name}' and all its tasks?")) {
                    self.engine.delete_project(&self.store, id);
                }
            }
            Action::NewTask(project_id) => {
                self.task_form = Some(TaskForm::new(project_id, TaskDraft::default()));
            }
            Action::EditTask(project_id, task_id) => {
                if let Some(task) = self.store.snapshot().task(project_id, task_id) {
                    self.task_form = Some(TaskForm::new(project_id, TaskDraft::from_task(task)));
                }
            }
            Action::SetTaskStatus {
                project_id,
                task_id,
                status,
            } => {
                self.engine
                    .update_task_status(&mut self.store, project_id, task_id, status);
            }
            Action::DeleteTask(project_id, task_id) => {
                let title = self
                    .store
                    .snapshot()
                    .task(project_id, task_id)
                    .map(|t| t.title.clone())
                    .unwrap_or_default();
                if confirm("Delete task", &format!("Delete task '{title}'?")) {
                    self.engine.delete_task(&self.store, project_id, task_id);
                }
            }
        }
    }

    fn project_name(&self, id: EntityId) -> String {
        self.store
            .snapshot()
            .project(id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    fn persist_filters(&mut self) {
        self.settings.filters = self.filter.clone();
        if let Err(e) = self.settings_file.save(&self.settings) {
            tracing::warn!(error = %e, "Failed to save settings");
        }
    }

    // --- Completions ---

    fn apply_outcomes(&mut self, now: f64) {
        for outcome in self.engine.poll(&mut self.store) {
            match &outcome {
                Outcome::Listed { .. } => self.loaded_once = true,
                Outcome::Failed(failure) if failure.operation == Operation::Load => {
                    self.loaded_once = true;
                }
                Outcome::Saved { kind, .. } | Outcome::SavedWithoutRefresh { kind, .. } => {
                    match kind {
                        EntityKind::Project => self.project_form = None,
                        EntityKind::Task => self.task_form = None,
                    }
                    self.selected_project = None;
                }
                Outcome::Deleted { key, .. } => self.forget(*key),
                _ => {}
            }

            let text = outcome.message();
            if !matches!(outcome, Outcome::Listed { .. }) {
                self.toasts.push(text.clone(), outcome.is_failure(), now);
            }
            self.status_message = text;
        }
    }

    /// Close anything still pointing at a deleted entity.
    fn forget(&mut self, key: EntityKey) {
        if let EntityKey::Project(id) = key {
            if self.details.is_some_and(|f| f.project_id == id) {
                self.details = None;
            }
            if self.task_list.is_some_and(|f| f.project_id == id) {
                self.task_list = None;
            }
            if self.task_form.as_ref().is_some_and(|f| f.project_id == id) {
                self.task_form = None;
            }
            if self.project_form.as_ref().is_some_and(|f| f.draft.id == Some(id)) {
                self.project_form = None;
            }
            if self.selected_project == Some(id) {
                self.selected_project = None;
            }
        }
    }

    // --- Panels ---

    fn show_forms(&mut self, ctx: &egui::Context) {
        let submitting = self.engine.is_submitting();

        if let Some(form) = &mut self.project_form {
            match ui::dialogs::show_project_form(form, submitting, ctx) {
                FormResponse::Submit => {
                    if let Err(errors) = self.engine.save_project(&form.draft) {
                        form.errors = errors;
                    }
                }
                FormResponse::Cancel => self.project_form = None,
                FormResponse::None => {}
            }
        }

        if let Some(form) = &mut self.task_form {
            let project_name = self
                .store
                .snapshot()
                .project(form.project_id)
                .map(|p| p.name.clone());
            match project_name {
                // The owning project disappeared on refresh.
                None => self.task_form = None,
                Some(name) => match ui::dialogs::show_task_form(form, &name, submitting, ctx) {
                    FormResponse::Submit => {
                        if let Err(errors) = self.engine.save_task(form.project_id, &form.draft) {
                            form.errors = errors;
                        }
                    }
                    FormResponse::Cancel => self.task_form = None,
                    FormResponse::None => {}
                },
            }
        }
    }

    fn show_windows(&mut self, ctx: &egui::Context) -> Action {
        let mut action = Action::None;
        let snapshot = self.store.snapshot().clone();

        if let Some(focus) = self.details {
            let mut open = true;
            match focus.resolve(&snapshot) {
                Some(project) => {
                    action = action.or(ui::project_details::show_project_details(
                        project, &mut open, ctx,
                    ));
                }
                None => open = false,
            }
            if !open {
                self.details = None;
            }
        }

        if let Some(focus) = self.task_list {
            let mut open = true;
            match focus.resolve(&snapshot) {
                Some(project) => {
                    action = action.or(ui::task_list::show_task_list(project, &mut open, ctx));
                }
                None => open = false,
            }
            if !open {
                self.task_list = None;
            }
        }

        action
    }
}

fn confirm(title: &str, description: &str) -> bool {
    rfd::MessageDialog::new()
        .set_title(title)
        .set_description(description)
        .set_level(rfd::MessageLevel::Warning)
        .set_buttons(rfd::MessageButtons::YesNo)
        .show()
        == rfd::MessageDialogResult::Yes
}

impl eframe::App for BoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        self.apply_outcomes(now);
        self.view.refresh(self.store.snapshot(), &self.filter);

        let mut action = Action::None;

        // Top panel: toolbar + filters
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            let visible = self.view.columns().total();
            let loading = self.engine.is_loading() || self.engine.is_search_pending();
            action = action.or(ui::toolbar::show_toolbar(
                &mut self.filter.search,
                visible,
                loading,
                ui,
            ));
            ui.add_space(2.0);
            action = action.or(ui::filter_bar::show_filter_bar(&mut self.filter, ui));
            ui.add_space(4.0);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_DARK)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_small())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("Projects: {}", self.store.snapshot().len()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Central panel: the board
        let board_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::same(10.0));
        egui::CentralPanel::default().frame(board_frame).show(ctx, |ui| {
            if !self.loaded_once {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }
            action = action.or(ui::board::show_board(
                self.view.columns(),
                self.selected_project,
                &mut self.drag,
                ui,
            ));
        });

        action = action.or(self.show_windows(ctx));
        self.show_forms(ctx);
        if self.show_about && ui::dialogs::show_about_dialog(ctx) {
            self.show_about = false;
        }
        self.toasts.show(ctx);

        if action != Action::None {
            tracing::debug!(?action, "UI action");
        }
        self.dispatch(action);
    }
}
