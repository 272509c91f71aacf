use egui::Ui;

use crate::app::AppState;
use crate::state::{node_display_name, InteractionMode};

pub fn show(ui: &mut Ui, state: &AppState) {
    let editor = &state.editor;
    ui.horizontal(|ui| {
        ui.weak(format!("Objects: {}", editor.scene.placed_count()));
        ui.separator();

        match editor.mode() {
            InteractionMode::Idle => match editor.selected().and_then(|id| Some((id, editor.scene.get(id)?))) {
                Some((id, node)) => {
                    ui.label(format!("Selected: {}", node_display_name(id, node)));
                }
                None => {
                    ui.weak("Ready");
                }
            },
            InteractionMode::Placing => {
                ui.colored_label(
                    egui::Color32::from_rgb(90, 90, 200),
                    format!("Placing {}: click the grid", editor.interaction.shape().label()),
                );
                ui.separator();
                ui.weak("Esc to cancel");
            }
            InteractionMode::Dragging { .. } => {
                ui.label("Moving object");
            }
        }

        let pending = editor.textures.pending();
        if pending > 0 {
            ui.separator();
            ui.colored_label(
                egui::Color32::from_rgb(200, 140, 40),
                format!("Loading {pending} texture(s)"),
            );
        }

        if let Some(notice) = &state.notice {
            ui.separator();
            ui.weak(notice);
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.weak(concat!("Scene Builder v", env!("CARGO_PKG_VERSION")));
        });
    });
}
