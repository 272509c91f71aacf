//! Shape selector and placement controls

use egui::Ui;
use shared::ShapeKind;

use crate::app::AppState;

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.label("Shape");

        let mut shape = state.editor.interaction.shape();
        egui::ComboBox::from_id_salt("shape_combo")
            .selected_text(shape.label())
            .show_ui(ui, |ui| {
                for kind in ShapeKind::ALL {
                    ui.selectable_value(&mut shape, kind, kind.label());
                }
            });
        if shape != state.editor.interaction.shape() {
            state.editor.set_shape(shape);
        }

        let placing = state.editor.interaction.is_placing();
        if ui
            .add_enabled(!placing, egui::Button::new("+ Add Shape"))
            .on_hover_text("Click the grid to place it (A)")
            .clicked()
        {
            state.editor.begin_placement(shape);
        }
        if placing && ui.button("Cancel").on_hover_text("Esc").clicked() {
            state.editor.cancel_placement();
        }

        ui.separator();

        let placed = state.editor.scene.placed_count();
        if ui
            .add_enabled(placed > 0, egui::Button::new("Clear"))
            .on_hover_text("Remove every placed object")
            .clicked()
        {
            state.editor.clear();
        }
    });
}
