use eframe::egui;

use crate::app::AppState;

const HINTS: [&str; 4] = [
    "Use the dropdown to select a shape",
    "Click Add Shape to place it on the grid",
    "Click a shape to edit color, size, material",
    "Use File > Export HTML to save your scene!",
];

pub fn show(ctx: &egui::Context, state: &mut AppState) {
    if !state.panels.welcome {
        return;
    }

    egui::Window::new("welcome")
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Welcome to 3D Builder!");
                ui.add_space(8.0);
                for hint in HINTS {
                    ui.label(hint);
                }
                ui.add_space(8.0);
                if ui.button("Got It!").clicked() {
                    state.panels.welcome = false;
                    state.editor.settings.ui.show_welcome = false;
                }
            });
        });
}
