//! 3D viewport panel

mod renderer;

pub use scene_builder_lib::viewport::{camera, mesh, picking};

pub use camera::ArcBallCamera;

use egui::{Pos2, Ui};
use glam::Vec2;

use crate::app::AppState;
use crate::render::NavigationControl;
use crate::state::{CursorStyle, Editor};
use picking::Ray;

/// Degrees of orbit per dragged pixel
const ORBIT_SPEED: f32 = 0.5;
const PAN_SPEED: f32 = 0.01;
const ZOOM_SPEED: f32 = 0.01;

/// Maps egui pointer input onto the editor and paints the scene.
pub struct ViewportPanel {
    last_pointer: Option<Pos2>,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self { last_pointer: None }
    }

    /// Put the camera back where the settings place it.
    pub fn reset_camera(&mut self, editor: &mut Editor<ArcBallCamera>) {
        let enabled = editor.navigation.is_enabled();
        editor.navigation = ArcBallCamera::from_settings(&editor.settings.camera);
        editor.navigation.set_enabled(enabled);
    }

    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let editor = &mut state.editor;
        let size = Vec2::new(rect.width(), rect.height());
        let ray_at = |editor: &Editor<ArcBallCamera>, pos: Pos2| -> Ray {
            let local = pos - rect.min;
            editor.navigation.screen_ray(Vec2::new(local.x, local.y), size)
        };

        // ── Pointer tracking ─────────────────────────────
        // A drag keeps reporting after the pointer leaves the rect
        let pointer = if editor.interaction.is_dragging() {
            ui.input(|i| i.pointer.latest_pos())
        } else {
            response.hover_pos()
        };
        if let Some(pos) = pointer {
            if self.last_pointer != Some(pos) {
                editor.pointer_move(&ray_at(editor, pos));
            }
        }
        self.last_pointer = pointer;

        // ── Buttons ─────────────────────────────
        let (pressed, released) = ui.input(|i| (i.pointer.primary_pressed(), i.pointer.primary_released()));
        if pressed {
            if let Some(pos) = response.hover_pos() {
                editor.pointer_down(&ray_at(editor, pos));
            }
        }
        if released {
            editor.pointer_up();
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                editor.click(&ray_at(editor, pos));
            }
        }
        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                editor.double_click(&ray_at(editor, pos));
            }
        }

        // ── Camera controls ─────────────────────────────
        if editor.navigation.is_enabled() {
            if response.dragged_by(egui::PointerButton::Primary) {
                let delta = response.drag_delta();
                editor.navigation.rotate(delta.x * ORBIT_SPEED, delta.y * ORBIT_SPEED);
            }
            if response.dragged_by(egui::PointerButton::Secondary) {
                let delta = response.drag_delta();
                editor.navigation.pan(-delta.x * PAN_SPEED, delta.y * PAN_SPEED);
            }
            if response.hovered() {
                let scroll = ui.input(|i| i.smooth_scroll_delta.y);
                if scroll.abs() > 0.1 {
                    editor.navigation.zoom(scroll * ZOOM_SPEED);
                }
            }
        }

        if response.hovered() && editor.cursor() == CursorStyle::Crosshair {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }

        renderer::paint_viewport(ui, rect, editor);
    }
}
