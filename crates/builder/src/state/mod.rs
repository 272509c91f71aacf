pub mod inspector;
pub mod interaction;
pub mod scene;
pub mod settings;

use std::path::Path;

use shared::{ObjectRecord, ShapeKind};

use crate::export::{self, ExportError, ExportedDocument};
use crate::render::{NavigationControl, RenderBackend};
use crate::texture::{TextureQueue, TextureRef, TextureSource};
use crate::viewport::picking::Ray;
pub use inspector::{Inspector, InspectorDraft};
pub use interaction::{CursorStyle, InteractionMachine, InteractionMode};
pub use scene::{node_display_name, node_from_script_id, script_id, short_id, NodeId, NodeKind, SceneGraph, SceneNode};
pub use settings::AppSettings;

/// Panel visibility flags
pub struct PanelVisibility {
    pub toolbar: bool,
    pub inspector: bool,
    pub status_bar: bool,
    pub welcome: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self {
            toolbar: true,
            inspector: true,
            status_bar: true,
            welcome: true,
        }
    }
}

/// The builder's model: scene, interaction, inspector and pending textures,
/// driven by a host that owns the camera navigation `N`.
///
/// Every input method keeps the inspector bound to the current selection.
/// Selection changes are also queued for the host, see
/// [`Editor::take_selection_events`].
pub struct Editor<N: NavigationControl> {
    pub scene: SceneGraph,
    pub interaction: InteractionMachine,
    pub inspector: Inspector,
    pub textures: TextureQueue,
    pub navigation: N,
    pub settings: AppSettings,
    selection_events: Vec<Option<NodeId>>,
}

impl<N: NavigationControl> Editor<N> {
    pub fn new(
        backend: Box<dyn RenderBackend>,
        textures: TextureQueue,
        navigation: N,
        settings: AppSettings,
    ) -> Self {
        Self {
            scene: SceneGraph::with_fixtures(backend, &settings.grid),
            interaction: InteractionMachine::new(),
            inspector: Inspector::default(),
            textures,
            navigation,
            settings,
            selection_events: Vec::new(),
        }
    }

    /// Currently selected placed object.
    pub fn selected(&self) -> Option<NodeId> {
        self.interaction.selected(&self.scene)
    }

    pub fn mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    pub fn cursor(&self) -> CursorStyle {
        self.interaction.cursor()
    }

    /// Drain selection notifications, oldest first.
    pub fn take_selection_events(&mut self) -> Vec<Option<NodeId>> {
        std::mem::take(&mut self.selection_events)
    }

    // ── UI commands ──────────────────────────────────────────

    pub fn begin_placement(&mut self, shape: ShapeKind) {
        self.interaction
            .begin_placement(shape, &mut self.scene, &mut self.navigation);
        self.sync_selection();
    }

    pub fn set_shape(&mut self, shape: ShapeKind) {
        self.interaction.set_shape(shape, &mut self.scene);
    }

    pub fn cancel_placement(&mut self) {
        self.interaction.cancel_placement(&mut self.scene);
    }

    pub fn activate(&mut self) {
        self.interaction.activate();
    }

    pub fn deactivate(&mut self) {
        self.interaction
            .deactivate(&mut self.scene, &mut self.navigation);
    }

    // ── Pointer input ────────────────────────────────────────

    pub fn pointer_move(&mut self, ray: &Ray) {
        self.interaction.pointer_move(ray, &mut self.scene);
    }

    pub fn pointer_down(&mut self, ray: &Ray) {
        self.interaction
            .pointer_down(ray, &self.scene, &mut self.navigation);
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up(&mut self.navigation);
    }

    /// Commit a placement or select. Returns the placed or selected object.
    pub fn click(&mut self, ray: &Ray) -> Option<NodeId> {
        let result = self.interaction.click(ray, &mut self.scene);
        self.sync_selection();
        result
    }

    /// Delete the object under the pointer. Returns the deleted id.
    pub fn double_click(&mut self, ray: &Ray) -> Option<NodeId> {
        let result = self
            .interaction
            .double_click(ray, &mut self.scene, &mut self.navigation);
        self.sync_selection();
        result
    }

    /// Select a placed object directly, as the inspector or a script would.
    pub fn select(&mut self, id: Option<NodeId>) -> bool {
        let id = id.filter(|id| self.scene.is_placed(*id));
        if id == self.selected() && id == self.inspector.target() {
            return false;
        }
        self.interaction.select(id);
        self.sync_selection();
        true
    }

    // ── Inspector ────────────────────────────────────────────

    /// Write the inspector draft to the selected object.
    pub fn apply_inspector(&mut self) -> bool {
        self.inspector.apply(&mut self.scene)
    }

    /// Delete the object bound to the inspector.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.inspector.live_target(&self.scene) else {
            return false;
        };
        let deleted = self
            .interaction
            .delete(id, &mut self.scene, &mut self.navigation);
        self.sync_selection();
        deleted
    }

    /// Queue an uploaded image as the selected object's texture.
    pub fn upload_texture(&mut self, name: &str, bytes: Vec<u8>) -> bool {
        let source = TextureSource::upload(name, bytes);
        self.inspector
            .upload_texture(source, &self.scene, &mut self.textures)
    }

    /// Apply finished texture decodes. Call once per frame.
    pub fn poll(&mut self) -> usize {
        self.textures.poll(&mut self.scene)
    }

    // ── Scene ────────────────────────────────────────────────

    /// Remove every placed object and reset transient interaction state.
    pub fn clear(&mut self) -> usize {
        self.interaction.pointer_up(&mut self.navigation);
        self.interaction.cancel_placement(&mut self.scene);
        if self.inspector.target().is_some() || self.selected().is_some() {
            self.interaction.select(None);
        }
        let removed = self.scene.clear_placed();
        self.sync_selection();
        tracing::info!("Cleared {removed} objects");
        removed
    }

    pub fn export(&self) -> Result<ExportedDocument, ExportError> {
        export::export_scene(&self.scene, &self.settings)
    }

    /// Replace placed objects with `records`. Textures referenced by the
    /// records are resolved against `base_dir` and bound at once; decoding
    /// runs asynchronously and only fills in size and colour, so a map that
    /// fails to load still round-trips through export.
    pub fn import(&mut self, records: &[ObjectRecord], base_dir: Option<&Path>) -> Vec<NodeId> {
        self.clear();
        let ids: Vec<NodeId> = records
            .iter()
            .map(|record| {
                let id = self.scene.add_placed(
                    record.shape,
                    record.transform(),
                    record.material.to_material(),
                );
                if let Some(map) = &record.material.map {
                    let source = TextureSource::from_locator(map, base_dir);
                    self.scene.set_texture(id, Some(TextureRef::unresolved(source.clone())));
                    self.textures.request(id, source);
                }
                id
            })
            .collect();
        tracing::info!("Imported {} objects", ids.len());
        ids
    }

    /// Read an exported document from disk and import it.
    pub fn import_file(&mut self, path: &Path) -> Result<Vec<NodeId>, ExportError> {
        let records = export::read_document(path)?;
        Ok(self.import(&records, path.parent()))
    }

    /// Export and write the document with its texture files.
    pub fn export_to(&self, path: &Path) -> Result<ExportedDocument, ExportError> {
        let doc = self.export()?;
        export::write_document(path, &doc)?;
        Ok(doc)
    }

    fn sync_selection(&mut self) {
        for change in self.interaction.take_selection_changes() {
            self.inspector.reflect(change, &self.scene);
            self.selection_events.push(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessBackend, NavigationSwitch};

    fn editor() -> Editor<NavigationSwitch> {
        Editor::new(
            Box::new(HeadlessBackend::new()),
            TextureQueue::inline(),
            NavigationSwitch::default(),
            AppSettings::default(),
        )
    }

    #[test]
    fn test_click_select_binds_inspector() {
        let mut ed = editor();
        ed.begin_placement(ShapeKind::Box);
        let id = ed.click(&Ray::down_at(2.4, 1.6)).unwrap();
        assert_eq!(ed.inspector.target(), None);

        ed.click(&Ray::down_at(2.0, 2.0));
        assert_eq!(ed.inspector.target(), Some(id));
        assert_eq!(ed.take_selection_events(), vec![Some(id)]);
        assert!(ed.take_selection_events().is_empty());
    }

    #[test]
    fn test_delete_selected_unbinds_inspector() {
        let mut ed = editor();
        ed.begin_placement(ShapeKind::Sphere);
        ed.click(&Ray::down_at(0.0, 0.0));
        ed.click(&Ray::down_at(0.0, 0.0));
        ed.take_selection_events();

        assert!(ed.delete_selected());
        assert_eq!(ed.scene.placed_count(), 0);
        assert_eq!(ed.inspector.target(), None);
        assert_eq!(ed.take_selection_events(), vec![None]);
        assert!(!ed.delete_selected());
    }

    #[test]
    fn test_clear_resets_placement() {
        let mut ed = editor();
        ed.begin_placement(ShapeKind::Box);
        ed.click(&Ray::down_at(1.0, 1.0));
        ed.begin_placement(ShapeKind::Box);
        ed.pointer_move(&Ray::down_at(3.0, 3.0));
        assert_eq!(ed.scene.ghost_count(), 1);

        assert_eq!(ed.clear(), 1);
        assert_eq!(ed.scene.ghost_count(), 0);
        assert_eq!(ed.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_import_replaces_placed_objects() {
        let mut ed = editor();
        ed.begin_placement(ShapeKind::Box);
        ed.click(&Ray::down_at(1.0, 1.0));

        let records: Vec<ObjectRecord> = serde_json::from_str(
            r##"[{"shape":"cylinder","position":[4,0.5,-1],"scale":[1,2,1],"rotation":[0,1,0],
                "material":{"color":1122867,"metalness":0.2,"roughness":0.5,"opacity":0.4,
                "transparent":true,"wireframe":false,"map":"textures/missing.png"}}]"##,
        )
        .unwrap();
        let ids = ed.import(&records, Some(Path::new("/nonexistent")));
        assert_eq!(ids.len(), 1);
        assert_eq!(ed.scene.placed_count(), 1);

        let node = ed.scene.get(ids[0]).unwrap();
        assert_eq!(node.shape(), Some(ShapeKind::Cylinder));
        assert_eq!(node.transform.scale, [1.0, 2.0, 1.0]);
        assert!(!node.material.depth_write);

        // The missing file fails to decode but the map stays bound
        assert_eq!(ed.poll(), 0);
        let texture = ed.scene.get(ids[0]).unwrap().texture.as_ref().unwrap();
        assert_eq!(texture.source.locator(), "textures/missing.png");
        assert_eq!(texture.size, None);
        let (records, assets) = export::snapshot(&ed.scene);
        assert_eq!(records[0].material.map.as_deref(), Some("textures/missing.png"));
        assert!(assets.is_empty());
    }
}
