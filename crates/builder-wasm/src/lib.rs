use glam::Vec3;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use scene_builder_lib::command::execute_json;
use scene_builder_lib::render::{HeadlessBackend, NavigationControl, NavigationSwitch};
use scene_builder_lib::state::settings::AppSettings;
use scene_builder_lib::export::{export_self_contained, parse_document};
use scene_builder_lib::state::{script_id, Editor, NodeId, NodeKind};
use scene_builder_lib::texture::TextureQueue;
use scene_builder_lib::viewport::picking::Ray;
use shared::{format_hex_color, parse_hex_color, ShapeKind, Transform};

/// One node the page should draw
#[derive(Serialize)]
struct Drawable {
    id: u64,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shape: Option<&'static str>,
    transform: Transform,
    color: String,
    metalness: f32,
    roughness: f32,
    opacity: f32,
    transparent: bool,
    wireframe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    texture: Option<String>,
}

/// Install the panic hook and route `tracing` to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    tracing::info!("Scene builder initialized");
}

fn ray(ox: f32, oy: f32, oz: f32, dx: f32, dy: f32, dz: f32) -> Ray {
    Ray::new(Vec3::new(ox, oy, oz), Vec3::new(dx, dy, dz))
}

fn shape_from(tag: &str) -> Result<ShapeKind, JsError> {
    ShapeKind::from_tag(tag).ok_or_else(|| JsError::new(&format!("Unknown shape '{tag}'")))
}

// JS numbers hold script ids exactly
fn id_or_null(id: Option<NodeId>) -> Option<f64> {
    id.map(|id| script_id(id) as f64)
}

/// Scene builder driven by a three.js page.
///
/// The page owns the camera and renderer: it casts rays from pointer
/// events, forwards them here and redraws from `drawables()`.
#[wasm_bindgen]
pub struct SceneBuilder {
    editor: Editor<NavigationSwitch>,
}

#[wasm_bindgen]
impl SceneBuilder {
    #[wasm_bindgen(constructor)]
    pub fn new() -> SceneBuilder {
        let mut editor = Editor::new(
            Box::new(HeadlessBackend::new()),
            TextureQueue::inline(),
            NavigationSwitch::default(),
            AppSettings::default(),
        );
        editor.activate();
        SceneBuilder { editor }
    }

    // ── Placement ─────────────────────────────

    pub fn begin_placement(&mut self, shape: &str) -> Result<(), JsError> {
        let shape = shape_from(shape)?;
        self.editor.begin_placement(shape);
        Ok(())
    }

    pub fn set_shape(&mut self, shape: &str) -> Result<(), JsError> {
        let shape = shape_from(shape)?;
        self.editor.set_shape(shape);
        Ok(())
    }

    pub fn cancel_placement(&mut self) {
        self.editor.cancel_placement();
    }

    pub fn deactivate(&mut self) {
        self.editor.deactivate();
    }

    // ── Pointer input ─────────────────────────────

    pub fn pointer_move(&mut self, ox: f32, oy: f32, oz: f32, dx: f32, dy: f32, dz: f32) {
        self.editor.pointer_move(&ray(ox, oy, oz, dx, dy, dz));
    }

    pub fn pointer_down(&mut self, ox: f32, oy: f32, oz: f32, dx: f32, dy: f32, dz: f32) {
        self.editor.pointer_down(&ray(ox, oy, oz, dx, dy, dz));
    }

    pub fn pointer_up(&mut self) {
        self.editor.pointer_up();
    }

    /// Returns the id of the placed or selected object, if any.
    pub fn click(&mut self, ox: f32, oy: f32, oz: f32, dx: f32, dy: f32, dz: f32) -> Option<f64> {
        id_or_null(self.editor.click(&ray(ox, oy, oz, dx, dy, dz)))
    }

    /// Returns the id of the deleted object, if any.
    pub fn double_click(&mut self, ox: f32, oy: f32, oz: f32, dx: f32, dy: f32, dz: f32) -> Option<f64> {
        id_or_null(self.editor.double_click(&ray(ox, oy, oz, dx, dy, dz)))
    }

    /// Whether the page's orbit controls may run.
    pub fn navigation_enabled(&self) -> bool {
        self.editor.navigation.is_enabled()
    }

    /// CSS cursor for the canvas.
    pub fn cursor(&self) -> String {
        match self.editor.cursor() {
            scene_builder_lib::state::CursorStyle::Crosshair => "crosshair".into(),
            scene_builder_lib::state::CursorStyle::Default => "default".into(),
        }
    }

    // ── Scene ─────────────────────────────

    /// Every ghost and placed object as a JSON array.
    pub fn drawables(&self) -> Result<String, JsError> {
        let drawables: Vec<Drawable> = self
            .editor
            .scene
            .iter()
            .filter_map(|(id, node)| {
                let (kind, shape) = match node.kind {
                    NodeKind::Ghost(shape) => ("ghost", shape),
                    NodeKind::Placed(shape) => ("placed", shape),
                    _ => return None,
                };
                let m = &node.material;
                Some(Drawable {
                    id: script_id(id),
                    kind,
                    shape: Some(shape.tag()),
                    transform: node.transform,
                    color: format_hex_color(m.color),
                    metalness: m.metalness,
                    roughness: m.roughness,
                    opacity: m.opacity,
                    transparent: m.transparent,
                    wireframe: m.wireframe,
                    texture: node.texture.as_ref().map(|t| t.source.locator().to_string()),
                })
            })
            .collect();
        serde_json::to_string(&drawables).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Selection changes since the last call: ids, or `null` for "nothing selected".
    pub fn take_selection_changes(&mut self) -> js_sys::Array {
        self.editor
            .take_selection_events()
            .into_iter()
            .map(|change| match id_or_null(change) {
                Some(id) => JsValue::from(id),
                None => JsValue::NULL,
            })
            .collect()
    }

    pub fn object_count(&self) -> usize {
        self.editor.scene.placed_count()
    }

    pub fn clear(&mut self) -> usize {
        self.editor.clear()
    }

    // ── Inspector ─────────────────────────────

    /// Inspector form values, or `null` when nothing is bound.
    pub fn inspector(&self) -> String {
        let editor = &self.editor;
        let Some(id) = editor.inspector.live_target(&editor.scene) else {
            return "null".into();
        };
        let draft = &editor.inspector.draft;
        serde_json::json!({
            "id": script_id(id),
            "color": format_hex_color(draft.color),
            "metalness": draft.metalness,
            "roughness": draft.roughness,
            "opacity": draft.opacity,
            "transparent": draft.transparent,
            "scale": draft.scale,
            "rotation_y": draft.rotation_y_degrees,
        })
        .to_string()
    }

    /// Copy form values into the draft and apply them to the bound object.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &mut self,
        color: &str,
        metalness: f32,
        roughness: f32,
        opacity: f32,
        transparent: bool,
        sx: f32,
        sy: f32,
        sz: f32,
        rotation_y: f32,
    ) -> Result<bool, JsError> {
        let color = parse_hex_color(color).ok_or_else(|| JsError::new(&format!("Invalid color '{color}'")))?;
        let draft = &mut self.editor.inspector.draft;
        draft.color = color;
        draft.metalness = metalness.clamp(0.0, 1.0);
        draft.roughness = roughness.clamp(0.0, 1.0);
        draft.opacity = opacity.clamp(0.0, 1.0);
        draft.transparent = transparent;
        draft.scale = [sx, sy, sz];
        draft.rotation_y_degrees = rotation_y;
        Ok(self.editor.apply_inspector())
    }

    pub fn delete_selected(&mut self) -> bool {
        self.editor.delete_selected()
    }

    /// Queue an image for the bound object; `poll` attaches it.
    pub fn upload_texture(&mut self, name: &str, bytes: Vec<u8>) -> bool {
        self.editor.upload_texture(name, bytes)
    }

    pub fn poll(&mut self) -> usize {
        self.editor.poll()
    }

    // ── Export / commands ─────────────────────────────

    /// Standalone page with uploaded textures inlined as data URLs.
    pub fn export_html(&self) -> Result<String, JsError> {
        let doc = export_self_contained(&self.editor.scene, &self.editor.settings)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(doc.html)
    }

    /// Load a page written by `export_html`, replacing the placed objects.
    pub fn import_html(&mut self, html: &str) -> Result<usize, JsError> {
        let records = parse_document(html).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.editor.import(&records, None).len())
    }

    /// Run one JSON command and return the JSON response.
    pub fn execute(&mut self, json: &str) -> Result<String, JsError> {
        let response = execute_json(&mut self.editor, json).map_err(|e| JsError::new(&e))?;
        if let Some(error) = &response.error {
            tracing::warn!("{error}");
        }
        serde_json::to_string(&response).map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}
