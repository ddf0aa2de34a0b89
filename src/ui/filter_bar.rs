use egui::{RichText, Ui};
use egui_phosphor::regular as icons;

use crate::model::{ProjectFilter, Responsible, Status, Team};
use crate::ui::{theme, Action};

/// Status, team and task-responsible pickers. "All" clears a dimension.
pub fn show_filter_bar(filter: &mut ProjectFilter, ui: &mut Ui) -> Action {
    let before = filter.clone();
    ui.horizontal(|ui| {
        ui.label(RichText::new(icons::FUNNEL).color(theme::TEXT_DIM));

        combo(ui, "filter_status", "Status", &mut filter.status, &Status::ALL, |s| {
            theme::status_text(s)
        });
        combo(ui, "filter_team", "Team", &mut filter.team, &Team::ALL, |t| {
            t.code().to_string()
        });
        combo(
            ui,
            "filter_responsible",
            "Responsible",
            &mut filter.responsible,
            &Responsible::ALL,
            |r| r.code().to_string(),
        );

        let has_filters =
            filter.status.is_some() || filter.team.is_some() || filter.responsible.is_some();
        if has_filters && ui.small_button("Clear filters").clicked() {
            filter.status = None;
            filter.team = None;
            filter.responsible = None;
        }
    });

    if *filter != before {
        Action::FiltersChanged
    } else {
        Action::None
    }
}

fn combo<T: Copy + PartialEq>(
    ui: &mut Ui,
    id: &str,
    label: &str,
    value: &mut Option<T>,
    options: &[T],
    text: impl Fn(T) -> String,
) {
    ui.label(RichText::new(label).size(11.0).color(theme::TEXT_SECONDARY));
    let selected = value.map_or_else(|| "All".to_string(), &text);
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected)
        .width(130.0)
        .show_ui(ui, |ui| {
            ui.selectable_value(value, None, "All");
            for option in options {
                ui.selectable_value(value, Some(*option), text(*option));
            }
        });
}
