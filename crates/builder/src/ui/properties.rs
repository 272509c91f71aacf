//! Inspector panel for the selected object

use egui::Ui;
use shared::format_hex_color;

use crate::app::AppState;
use crate::state::{node_display_name, short_id, InspectorDraft};

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Inspector");
    ui.separator();

    let editor = &mut state.editor;
    let Some(id) = editor.inspector.live_target(&editor.scene) else {
        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            ui.weak("Click a shape");
            ui.weak("to edit its properties");
        });
        return;
    };
    let Some(node) = editor.scene.get(id) else { return };
    let name = node_display_name(id, node);
    let has_texture = node.texture.is_some();

    ui.horizontal(|ui| {
        ui.strong(&name);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.weak(format!("#{}", short_id(id)));
        });
    });
    ui.add_space(4.0);

    show_material(ui, &mut editor.inspector.draft);
    ui.add_space(6.0);
    show_transform(ui, &mut editor.inspector.draft);
    ui.add_space(6.0);

    let texture_label = editor.scene.get(id).and_then(|n| n.texture.as_ref()).map(|tex| match tex.size {
        Some([w, h]) => format!("{} ({w}x{h})", tex.source.locator()),
        None => tex.source.locator().to_string(),
    });
    let loading = editor.textures.pending() > 0;

    let mut upload = false;
    egui::CollapsingHeader::new("Texture")
        .id_salt("inspector_texture")
        .default_open(true)
        .show(ui, |ui| {
            if let Some(label) = &texture_label {
                ui.weak(label);
            } else if loading {
                ui.weak("Loading...");
            }
            let caption = if has_texture { "Replace image..." } else { "Upload image..." };
            upload = ui.button(caption).clicked();
        });
    if upload {
        pick_texture(state);
    }

    ui.add_space(8.0);
    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Apply").clicked() {
            state.editor.apply_inspector();
        }
        if ui
            .button(egui::RichText::new("Delete").color(egui::Color32::from_rgb(200, 60, 60)))
            .clicked()
        {
            state.editor.delete_selected();
        }
    });
}

fn show_material(ui: &mut Ui, draft: &mut InspectorDraft) {
    egui::CollapsingHeader::new("Material")
        .id_salt("inspector_material")
        .default_open(true)
        .show(ui, |ui| {
            egui::Grid::new("inspector_material_grid")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    ui.label("Color");
                    ui.horizontal(|ui| {
                        let mut rgb = [(draft.color >> 16) as u8, (draft.color >> 8) as u8, draft.color as u8];
                        if ui.color_edit_button_srgb(&mut rgb).changed() {
                            draft.color = u32::from(rgb[0]) << 16 | u32::from(rgb[1]) << 8 | u32::from(rgb[2]);
                        }
                        ui.monospace(format_hex_color(draft.color));
                    });
                    ui.end_row();

                    ui.label("Metalness");
                    ui.add(egui::Slider::new(&mut draft.metalness, 0.0..=1.0).step_by(0.01));
                    ui.end_row();

                    ui.label("Roughness");
                    ui.add(egui::Slider::new(&mut draft.roughness, 0.0..=1.0).step_by(0.01));
                    ui.end_row();

                    ui.label("Opacity");
                    ui.add(egui::Slider::new(&mut draft.opacity, 0.0..=1.0).step_by(0.01));
                    ui.end_row();
                });
            ui.checkbox(&mut draft.transparent, "Transparent (wireframe)");
        });
}

fn show_transform(ui: &mut Ui, draft: &mut InspectorDraft) {
    egui::CollapsingHeader::new("Transform")
        .id_salt("inspector_transform")
        .default_open(true)
        .show(ui, |ui| {
            egui::Grid::new("inspector_transform_grid")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    ui.label("Scale");
                    ui.horizontal(|ui| {
                        for (axis, value) in ["X", "Y", "Z"].into_iter().zip(draft.scale.iter_mut()) {
                            ui.add(egui::DragValue::new(value).speed(0.05).prefix(format!("{axis} ")));
                        }
                    });
                    ui.end_row();

                    ui.label("Rotation Y");
                    ui.add(
                        egui::DragValue::new(&mut draft.rotation_y_degrees)
                            .speed(1.0)
                            .suffix("°"),
                    );
                    ui.end_row();
                });
        });
}

fn pick_texture(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Choose Texture")
        .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
        .pick_file()
    else {
        return;
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "texture".to_string());
    match std::fs::read(&path) {
        Ok(bytes) => {
            state.editor.upload_texture(&name, bytes);
        }
        Err(e) => {
            tracing::error!("Failed to read {}: {e}", path.display());
            state.notice = Some(format!("Could not read {name}"));
        }
    }
}
