//! Headless test harness for driving the builder programmatically.
//!
//! Wraps an [`Editor`] with a headless backend, inline texture decoding
//! and an orbit camera over a fixed-size viewport, so tests can speak in
//! either grid coordinates or screen pixels.

use glam::{Vec2, Vec3};
use shared::{ObjectRecord, ShapeKind};

use crate::export::{ExportError, ExportedDocument};
use crate::render::{HeadlessBackend, NavigationControl};
use crate::state::{AppSettings, Editor, InteractionMode, NodeId};
use crate::texture::TextureQueue;
use crate::validation::{validate_shape, MeshIssue};
use crate::viewport::camera::ArcBallCamera;
use crate::viewport::picking::Ray;

/// Viewport size used for screen-space helpers
pub const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

/// Headless builder: editor, camera and a fixed viewport
pub struct TestHarness {
    pub editor: Editor<ArcBallCamera>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Fresh scene with default settings and fixtures.
    pub fn new() -> Self {
        Self::with_settings(AppSettings::default())
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        let camera = ArcBallCamera::from_settings(&settings.camera);
        Self {
            editor: Editor::new(
                Box::new(HeadlessBackend::new()),
                TextureQueue::inline(),
                camera,
                settings,
            ),
        }
    }

    // ── Grid-space input ─────────────────────────────────────

    /// Full placement gesture: begin, hover, click. Returns the new object.
    pub fn place(&mut self, shape: ShapeKind, x: f32, z: f32) -> Option<NodeId> {
        self.editor.begin_placement(shape);
        let ray = Ray::down_at(x, z);
        self.editor.pointer_move(&ray);
        self.editor.click(&ray)
    }

    pub fn move_to(&mut self, x: f32, z: f32) {
        self.editor.pointer_move(&Ray::down_at(x, z));
    }

    pub fn click_at(&mut self, x: f32, z: f32) -> Option<NodeId> {
        self.editor.click(&Ray::down_at(x, z))
    }

    pub fn press_at(&mut self, x: f32, z: f32) {
        self.editor.pointer_down(&Ray::down_at(x, z));
    }

    pub fn release(&mut self) {
        self.editor.pointer_up();
    }

    pub fn double_click_at(&mut self, x: f32, z: f32) -> Option<NodeId> {
        self.editor.double_click(&Ray::down_at(x, z))
    }

    /// Press at `from`, move to `to`, release.
    pub fn drag(&mut self, from: (f32, f32), to: (f32, f32)) {
        self.press_at(from.0, from.1);
        self.move_to(to.0, to.1);
        self.release();
    }

    // ── Screen-space input ───────────────────────────────────

    /// Ray through a viewport pixel from the current camera.
    pub fn screen_ray(&self, pixel: Vec2) -> Ray {
        self.editor.navigation.screen_ray(pixel, VIEWPORT)
    }

    /// Pixel where a world point appears, if in front of the camera.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        self.editor
            .navigation
            .project(point, VIEWPORT)
            .map(|(pixel, _)| pixel)
    }

    pub fn click_pixel(&mut self, pixel: Vec2) -> Option<NodeId> {
        let ray = self.screen_ray(pixel);
        self.editor.click(&ray)
    }

    pub fn move_pixel(&mut self, pixel: Vec2) {
        let ray = self.screen_ray(pixel);
        self.editor.pointer_move(&ray);
    }

    // ── Queries ──────────────────────────────────────────────

    pub fn mode(&self) -> InteractionMode {
        self.editor.mode()
    }

    pub fn placed_count(&self) -> usize {
        self.editor.scene.placed_count()
    }

    pub fn position_of(&self, id: NodeId) -> Option<[f32; 3]> {
        self.editor.scene.get(id).map(|n| n.transform.position)
    }

    pub fn navigation_enabled(&self) -> bool {
        self.editor.navigation.is_enabled()
    }

    /// Records for every placed object, in scene order.
    pub fn records(&self) -> Vec<ObjectRecord> {
        crate::export::snapshot(&self.editor.scene).0
    }

    pub fn export(&self) -> Result<ExportedDocument, ExportError> {
        self.editor.export()
    }

    /// Mesh issues behind each placed object, keyed by display name.
    /// Empty when every mesh is sound.
    pub fn validate_meshes(&self) -> Vec<(String, Vec<MeshIssue>)> {
        self.editor
            .scene
            .placed()
            .filter_map(|(id, node)| {
                let errors = validate_shape(node.shape()?);
                (!errors.is_empty()).then(|| (crate::state::node_display_name(id, node), errors))
            })
            .collect()
    }
}
