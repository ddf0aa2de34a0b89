use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

use crate::model::Status;
use crate::ui::{theme, Action};

/// Render the top toolbar / menu bar.
///
/// Edits `search` in place and reports [`Action::SearchChanged`] when it
/// changed this frame.
pub fn show_toolbar(search: &mut String, visible: usize, loading: bool, ui: &mut Ui) -> Action {
    let mut action = Action::None;
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  Board  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{}  Refresh", icons::ARROWS_CLOCKWISE)).clicked() {
                action = Action::Refresh;
                ui.close_menu();
            }
            if ui.button(format!("{}  New project", icons::PLUS)).clicked() {
                action = Action::NewProject(Status::Planejado);
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("About").clicked() {
                action = Action::ShowAbout;
                ui.close_menu();
            }
        });

        ui.add_space(12.0);
        ui.label(RichText::new(icons::MAGNIFYING_GLASS).color(theme::TEXT_DIM));
        let edit = ui.add_sized(
            [220.0, 22.0],
            egui::TextEdit::singleline(search).hint_text("Search projects by name..."),
        );
        if edit.changed() {
            action = Action::SearchChanged;
        }
        if !search.is_empty()
            && ui
                .add(egui::Button::new(RichText::new(icons::X).size(11.0)).frame(false))
                .on_hover_text("Clear search")
                .clicked()
        {
            search.clear();
            action = Action::SearchChanged;
        }

        // Right-aligned project count
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(format!("{visible} project(s)"))
                    .size(11.0)
                    .weak(),
            );
            if loading {
                ui.spinner();
            }
        });
    });
    action
}
