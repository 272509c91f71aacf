//! Keyboard shortcut handling

use eframe::egui;

use super::AppState;

/// Handle keyboard shortcuts for the application
pub fn handle_keyboard(ctx: &egui::Context, state: &mut AppState) {
    // Don't handle shortcuts when a text field is focused
    if ctx.memory(|m| m.focused().is_some()) {
        return;
    }

    let (escape, delete, add) = ctx.input(|i| {
        (
            i.key_pressed(egui::Key::Escape),
            i.key_pressed(egui::Key::Delete),
            i.key_pressed(egui::Key::A) && !i.modifiers.command,
        )
    });

    // Escape: leave placement, otherwise drop the selection
    if escape {
        if state.editor.interaction.is_placing() {
            state.editor.cancel_placement();
        } else {
            state.editor.select(None);
        }
    }
    // Delete: remove the inspected object
    if delete {
        state.editor.delete_selected();
    }
    // A: place another of the current shape
    if add {
        let shape = state.editor.interaction.shape();
        state.editor.begin_placement(shape);
    }
}
