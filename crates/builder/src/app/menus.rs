//! Application menu bar and settings window

use std::path::Path;

use eframe::egui;

use super::AppState;
use crate::state::settings::AppSettings;
use crate::viewport::ViewportPanel;

/// Show the file menu
pub fn file_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button("File", |ui| {
        if ui.button("New scene").clicked() {
            state.editor.clear();
            state.notice = None;
            ui.close_menu();
        }
        if ui.button("Import HTML...").clicked() {
            ui.close_menu();
            if let Some(path) = rfd::FileDialog::new()
                .set_title("Import Scene")
                .add_filter("HTML", &["html", "htm"])
                .pick_file()
            {
                import_from(state, &path);
            }
        }
        if ui.button("Export HTML...").clicked() {
            ui.close_menu();
            if let Some(path) = rfd::FileDialog::new()
                .set_title("Export Scene")
                .add_filter("HTML", &["html"])
                .set_file_name(&state.settings().export.file_name)
                .save_file()
            {
                export_to(state, &path);
            }
        }
        ui.separator();
        if ui.button("Settings...").clicked() {
            state.show_settings = true;
            ui.close_menu();
        }
        ui.separator();
        if ui.button("Quit").clicked() {
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

/// Load an exported document, replacing the placed objects.
pub fn import_from(state: &mut AppState, path: &Path) {
    match state.editor.import_file(path) {
        Ok(ids) => {
            state.notice = Some(format!("Imported {} objects", ids.len()));
        }
        Err(e) => {
            tracing::error!("Failed to import {}: {e}", path.display());
            state.notice = Some(format!("Import failed: {e}"));
        }
    }
}

fn export_to(state: &mut AppState, path: &Path) {
    match state.editor.export_to(path) {
        Ok(doc) => {
            state.notice = Some(format!(
                "Exported {} objects to {}",
                doc.records.len(),
                path.display()
            ));
        }
        Err(e) => {
            tracing::error!("Failed to export {}: {e}", path.display());
            state.notice = Some(format!("Export failed: {e}"));
        }
    }
}

/// Show the view menu
pub fn view_menu(ui: &mut egui::Ui, state: &mut AppState, viewport: &mut ViewportPanel) {
    ui.menu_button("View", |ui| {
        ui.checkbox(&mut state.panels.toolbar, "Toolbar");
        ui.checkbox(&mut state.panels.inspector, "Inspector");
        ui.checkbox(&mut state.panels.status_bar, "Status bar");
        ui.checkbox(&mut state.editor.settings.grid.visible, "Grid");
        ui.separator();
        if ui.button("Reset camera").clicked() {
            viewport.reset_camera(&mut state.editor);
            ui.close_menu();
        }
    });
}

/// Show the help menu
pub fn help_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button("Help", |ui| {
        if ui.button("Welcome").clicked() {
            state.panels.welcome = true;
            ui.close_menu();
        }
    });
}

/// Show the settings window
pub fn settings_window(ctx: &egui::Context, state: &mut AppState) {
    let mut open = state.show_settings;
    egui::Window::new("Settings")
        .open(&mut open)
        .resizable(true)
        .default_width(360.0)
        .show(ctx, |ui| {
            let settings = &mut state.editor.settings;
            show_viewport_settings(ui, settings);
            show_export_settings(ui, settings);
            show_ui_settings(ui, settings);
            show_settings_buttons(ui, state);
        });
    state.show_settings = open && state.show_settings;
}

fn show_viewport_settings(ui: &mut egui::Ui, settings: &mut AppSettings) {
    ui.heading("Viewport");
    ui.checkbox(&mut settings.grid.visible, "Show grid");
    ui.horizontal(|ui| {
        ui.label("Background");
        ui.color_edit_button_srgb(&mut settings.viewport.background_color);
    });
    ui.horizontal(|ui| {
        ui.label("Selection");
        ui.color_edit_button_srgb(&mut settings.viewport.selection_color);
    });
    ui.add_space(10.0);
}

fn show_export_settings(ui: &mut egui::Ui, settings: &mut AppSettings) {
    ui.heading("Export");
    egui::Grid::new("export_settings")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.label("Page title");
            ui.text_edit_singleline(&mut settings.export.title);
            ui.end_row();

            ui.label("File name");
            ui.text_edit_singleline(&mut settings.export.file_name);
            ui.end_row();

            ui.label("three.js module");
            ui.text_edit_singleline(&mut settings.export.three_module_url);
            ui.end_row();

            ui.label("OrbitControls module");
            ui.text_edit_singleline(&mut settings.export.orbit_controls_url);
            ui.end_row();
        });
    ui.add_space(10.0);
}

fn show_ui_settings(ui: &mut egui::Ui, settings: &mut AppSettings) {
    ui.heading("Interface");
    ui.horizontal(|ui| {
        ui.label("Font size");
        ui.add(
            egui::DragValue::new(&mut settings.ui.font_size)
                .speed(0.5)
                .range(8.0..=24.0)
                .suffix(" pt"),
        );
    });
    ui.checkbox(&mut settings.ui.show_welcome, "Show welcome on startup");
    ui.add_space(10.0);
}

fn show_settings_buttons(ui: &mut egui::Ui, state: &mut AppState) {
    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Save").clicked() {
            state.editor.settings.save();
        }
        if ui.button("Reset").clicked() {
            state.editor.settings = AppSettings::default();
        }
        if ui.button("Close").clicked() {
            state.show_settings = false;
        }
    });
}
