//! Interaction state machine
//!
//! Interprets pointer input against the scene graph: placing new shapes
//! behind a preview ghost, dragging placed objects across the grid,
//! selecting and deleting. Pointer events arrive as world-space rays.
//!
//! Placement and drag claim pointer events before plain selection does.
//! A pick that hits nothing never changes state.

use shared::{Material, ShapeKind, Transform};

use crate::render::NavigationControl;
use crate::state::scene::{NodeId, NodeKind, SceneGraph};
use crate::viewport::picking::{pick_ground, pick_placed, snap_to_grid, Ray};

/// Current pointer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Placing,
    /// Holding a placed object under the pointer
    Dragging { target: NodeId },
}

/// Pointer cursor the host should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Crosshair,
}

/// Placement, selection and drag logic.
#[derive(Debug)]
pub struct InteractionMachine {
    mode: InteractionMode,
    shape: ShapeKind,
    ghost: Option<NodeId>,
    selected: Option<NodeId>,
    /// Pointer input is only handled between `activate` and `deactivate`
    active: bool,
    /// Outgoing "selection changed" notifications
    selection_changes: Vec<Option<NodeId>>,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionMachine {
    /// An active machine in Idle.
    pub fn new() -> Self {
        Self {
            mode: InteractionMode::Idle,
            shape: ShapeKind::Box,
            ghost: None,
            selected: None,
            active: true,
            selection_changes: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_placing(&self) -> bool {
        self.mode == InteractionMode::Placing
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, InteractionMode::Dragging { .. })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Shape the next placement will create.
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn ghost(&self) -> Option<NodeId> {
        self.ghost
    }

    /// Selected object, if it still exists.
    pub fn selected(&self, scene: &SceneGraph) -> Option<NodeId> {
        self.selected.filter(|id| scene.is_placed(*id))
    }

    pub fn cursor(&self) -> CursorStyle {
        match self.mode {
            InteractionMode::Placing => CursorStyle::Crosshair,
            _ => CursorStyle::Default,
        }
    }

    /// Drain pending selection notifications, oldest first.
    pub fn take_selection_changes(&mut self) -> Vec<Option<NodeId>> {
        std::mem::take(&mut self.selection_changes)
    }

    // ── Lifecycle ────────────────────────────────────────────

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Stop handling input and drop transient state: the ghost is disposed
    /// and an ongoing drag is released.
    pub fn deactivate(&mut self, scene: &mut SceneGraph, nav: &mut dyn NavigationControl) {
        self.dispose_ghost(scene);
        if self.is_dragging() {
            nav.set_enabled(true);
        }
        self.mode = InteractionMode::Idle;
        self.active = false;
    }

    // ── UI commands ──────────────────────────────────────────

    /// "Shape kind changed": the next ghost and commit use `shape`.
    pub fn set_shape(&mut self, shape: ShapeKind, scene: &mut SceneGraph) {
        if self.shape == shape {
            return;
        }
        self.shape = shape;
        // A visible ghost is rebuilt in place so it never shows a stale shape
        if let Some(position) = self.ghost.and_then(|g| scene.get(g)).map(|n| n.transform.position) {
            let at = glam::Vec3::new(position[0], 0.0, position[2]);
            self.recreate_ghost(scene, snap_to_grid(at, shape));
        }
    }

    /// "Begin placement": enter Placing with `shape`.
    pub fn begin_placement(&mut self, shape: ShapeKind, scene: &mut SceneGraph, nav: &mut dyn NavigationControl) {
        if !self.active {
            return;
        }
        if self.is_dragging() {
            self.end_drag(nav);
        }
        self.set_shape(shape, scene);
        self.mode = InteractionMode::Placing;
        tracing::info!("Placing {}", shape.label());
    }

    /// Leave Placing without committing.
    pub fn cancel_placement(&mut self, scene: &mut SceneGraph) {
        if !self.is_placing() {
            return;
        }
        self.dispose_ghost(scene);
        self.mode = InteractionMode::Idle;
        tracing::info!("Placement cancelled");
    }

    // ── Pointer events ───────────────────────────────────────

    pub fn pointer_move(&mut self, ray: &Ray, scene: &mut SceneGraph) {
        if !self.active {
            return;
        }
        match self.mode {
            InteractionMode::Idle => {}
            InteractionMode::Placing => {
                let Some(hit) = pick_ground(ray, scene) else { return };
                self.recreate_ghost(scene, snap_to_grid(hit.point, self.shape));
            }
            InteractionMode::Dragging { target } => {
                let Some(shape) = scene.get(target).and_then(|n| n.shape()) else {
                    return;
                };
                let Some(hit) = pick_ground(ray, scene) else { return };
                scene.set_position(target, snap_to_grid(hit.point, shape));
            }
        }
    }

    /// Pointer pressed: start dragging the placed object under the pointer.
    pub fn pointer_down(&mut self, ray: &Ray, scene: &SceneGraph, nav: &mut dyn NavigationControl) {
        if !self.active || self.mode != InteractionMode::Idle {
            return;
        }
        let Some(hit) = pick_placed(ray, scene) else { return };
        self.mode = InteractionMode::Dragging { target: hit.node };
        nav.set_enabled(false);
        tracing::debug!("Drag started on {:?}", hit.node);
    }

    /// Pointer released: end a drag.
    pub fn pointer_up(&mut self, nav: &mut dyn NavigationControl) {
        if !self.active {
            return;
        }
        if self.is_dragging() {
            self.end_drag(nav);
        }
    }

    /// Click: commit a placement, or select the placed object under the pointer.
    pub fn click(&mut self, ray: &Ray, scene: &mut SceneGraph) -> Option<NodeId> {
        if !self.active {
            return None;
        }
        match self.mode {
            InteractionMode::Placing => self.commit_placement(ray, scene),
            InteractionMode::Dragging { .. } => None,
            InteractionMode::Idle => {
                let hit = pick_placed(ray, scene)?;
                self.select(Some(hit.node));
                Some(hit.node)
            }
        }
    }

    /// Double-click: delete the placed object under the pointer, in any mode.
    pub fn double_click(&mut self, ray: &Ray, scene: &mut SceneGraph, nav: &mut dyn NavigationControl) -> Option<NodeId> {
        if !self.active {
            return None;
        }
        let hit = pick_placed(ray, scene)?;
        self.delete(hit.node, scene, nav).then_some(hit.node)
    }

    /// Destroy a placed object. Shared by double-click and the inspector.
    pub fn delete(&mut self, id: NodeId, scene: &mut SceneGraph, nav: &mut dyn NavigationControl) -> bool {
        if !scene.is_placed(id) {
            return false;
        }
        if self.mode == (InteractionMode::Dragging { target: id }) {
            self.end_drag(nav);
        }
        scene.remove(id);
        if self.selected == Some(id) {
            self.select(None);
        }
        tracing::info!("Deleted object {:?}", id);
        true
    }

    /// Change the selection and queue a notification.
    pub fn select(&mut self, id: Option<NodeId>) {
        self.selected = id;
        self.selection_changes.push(id);
    }

    // ── Internals ────────────────────────────────────────────

    fn commit_placement(&mut self, ray: &Ray, scene: &mut SceneGraph) -> Option<NodeId> {
        let hit = pick_ground(ray, scene)?;
        let position = self
            .ghost
            .and_then(|g| scene.get(g))
            .map(|ghost| ghost.transform.position)
            .unwrap_or_else(|| snap_to_grid(hit.point, self.shape));

        let id = scene.add(
            NodeKind::Placed(self.shape),
            Transform::at(position),
            Material::placed(),
        );
        self.dispose_ghost(scene);
        self.mode = InteractionMode::Idle;
        tracing::info!("Placed {} at {:?}", self.shape.label(), position);
        Some(id)
    }

    /// Replace the ghost: the old one is fully disposed before the new one
    /// exists. `&mut self` keeps this from being interleaved with other input.
    fn recreate_ghost(&mut self, scene: &mut SceneGraph, position: [f32; 3]) {
        self.dispose_ghost(scene);
        self.ghost = Some(scene.add(
            NodeKind::Ghost(self.shape),
            Transform::at(position),
            Material::preview(),
        ));
    }

    fn dispose_ghost(&mut self, scene: &mut SceneGraph) {
        if let Some(ghost) = self.ghost.take() {
            scene.remove(ghost);
        }
    }

    fn end_drag(&mut self, nav: &mut dyn NavigationControl) {
        self.mode = InteractionMode::Idle;
        nav.set_enabled(true);
        tracing::debug!("Drag ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessBackend, NavigationSwitch};
    use crate::state::settings::GridSettings;

    fn setup() -> (InteractionMachine, SceneGraph, NavigationSwitch) {
        (
            InteractionMachine::new(),
            SceneGraph::with_fixtures(Box::new(HeadlessBackend::new()), &GridSettings::default()),
            NavigationSwitch::default(),
        )
    }

    fn place(m: &mut InteractionMachine, scene: &mut SceneGraph, nav: &mut NavigationSwitch, shape: ShapeKind, x: f32, z: f32) -> NodeId {
        m.begin_placement(shape, scene, nav);
        m.pointer_move(&Ray::down_at(x, z), scene);
        m.click(&Ray::down_at(x, z), scene).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let (m, scene, _) = setup();
        assert_eq!(m.mode(), InteractionMode::Idle);
        assert_eq!(m.cursor(), CursorStyle::Default);
        assert!(m.selected(&scene).is_none());
    }

    #[test]
    fn test_begin_placement_sets_crosshair() {
        let (mut m, mut scene, mut nav) = setup();
        m.begin_placement(ShapeKind::Sphere, &mut scene, &mut nav);
        assert!(m.is_placing());
        assert_eq!(m.shape(), ShapeKind::Sphere);
        assert_eq!(m.cursor(), CursorStyle::Crosshair);
    }

    #[test]
    fn test_ghost_follows_pointer_and_is_unique() {
        let (mut m, mut scene, mut nav) = setup();
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);

        m.pointer_move(&Ray::down_at(1.2, 0.0), &mut scene);
        let first = m.ghost().unwrap();
        m.pointer_move(&Ray::down_at(4.7, -3.1), &mut scene);
        let second = m.ghost().unwrap();

        assert_ne!(first, second);
        assert!(!scene.contains(first));
        assert_eq!(scene.ghost_count(), 1);
        assert_eq!(scene.get(second).unwrap().transform.position, [5.0, 0.5, -3.0]);
    }

    #[test]
    fn test_ghost_move_disposes_previous_resources() {
        let (mut m, mut scene, mut nav) = setup();
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        let before = scene.resources();
        for i in 0..5 {
            m.pointer_move(&Ray::down_at(i as f32, 0.0), &mut scene);
        }
        let after = scene.resources();
        assert_eq!(after.live_geometries, before.live_geometries + 1);
        assert_eq!(after.disposed_geometries, before.disposed_geometries + 4);
    }

    #[test]
    fn test_ghost_miss_keeps_previous_ghost() {
        let (mut m, mut scene, mut nav) = setup();
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        m.pointer_move(&Ray::down_at(1.0, 1.0), &mut scene);
        let ghost = m.ghost();
        m.pointer_move(&Ray::down_at(100.0, 0.0), &mut scene);
        assert_eq!(m.ghost(), ghost);
        assert!(m.is_placing());
    }

    #[test]
    fn test_commit_placement() {
        let (mut m, mut scene, mut nav) = setup();
        let id = place(&mut m, &mut scene, &mut nav, ShapeKind::Box, 2.4, 1.6);

        assert_eq!(m.mode(), InteractionMode::Idle);
        assert_eq!(m.cursor(), CursorStyle::Default);
        assert!(m.ghost().is_none());
        assert_eq!(scene.ghost_count(), 0);
        assert_eq!(scene.placed_count(), 1);

        let node = scene.get(id).unwrap();
        assert!(node.is_placed());
        assert_eq!(node.transform.position, [2.0, 0.5, 2.0]);
        assert_eq!(node.material, Material::placed());
    }

    #[test]
    fn test_commit_without_prior_move() {
        let (mut m, mut scene, mut nav) = setup();
        m.begin_placement(ShapeKind::TorusKnot, &mut scene, &mut nav);
        let id = m.click(&Ray::down_at(-3.3, 0.4), &mut scene).unwrap();
        assert_eq!(scene.get(id).unwrap().transform.position, [-3.0, 1.0, 0.0]);
    }

    #[test]
    fn test_commit_miss_stays_placing() {
        let (mut m, mut scene, mut nav) = setup();
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        assert!(m.click(&Ray::down_at(99.0, 99.0), &mut scene).is_none());
        assert!(m.is_placing());
        assert_eq!(scene.placed_count(), 0);
    }

    #[test]
    fn test_placement_click_does_not_select() {
        let (mut m, mut scene, mut nav) = setup();
        place(&mut m, &mut scene, &mut nav, ShapeKind::Box, 0.0, 0.0);
        // Placing a second object on top of the first commits rather than selects
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        m.click(&Ray::down_at(0.0, 0.0), &mut scene);
        assert_eq!(scene.placed_count(), 2);
        assert!(m.take_selection_changes().is_empty());
    }

    #[test]
    fn test_shape_change_rebuilds_ghost() {
        let (mut m, mut scene, mut nav) = setup();
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        m.pointer_move(&Ray::down_at(2.0, 2.0), &mut scene);
        m.set_shape(ShapeKind::TorusKnot, &mut scene);

        let ghost = scene.get(m.ghost().unwrap()).unwrap();
        assert_eq!(ghost.kind, NodeKind::Ghost(ShapeKind::TorusKnot));
        assert_eq!(ghost.transform.position, [2.0, 1.0, 2.0]);
        assert_eq!(scene.ghost_count(), 1);
    }

    #[test]
    fn test_cancel_placement() {
        let (mut m, mut scene, mut nav) = setup();
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        m.pointer_move(&Ray::down_at(0.0, 0.0), &mut scene);
        m.cancel_placement(&mut scene);
        assert_eq!(m.mode(), InteractionMode::Idle);
        assert_eq!(scene.ghost_count(), 0);
    }

    #[test]
    fn test_drag_moves_object_and_toggles_navigation() {
        let (mut m, mut scene, mut nav) = setup();
        let id = place(&mut m, &mut scene, &mut nav, ShapeKind::Cylinder, 0.0, 0.0);

        m.pointer_down(&Ray::down_at(0.1, 0.1), &scene, &mut nav);
        assert_eq!(m.mode(), InteractionMode::Dragging { target: id });
        assert!(!nav.is_enabled());

        m.pointer_move(&Ray::down_at(5.3, -1.2), &mut scene);
        assert_eq!(scene.get(id).unwrap().transform.position, [5.0, 0.5, -1.0]);
        m.pointer_move(&Ray::down_at(6.6, -1.2), &mut scene);
        assert_eq!(scene.get(id).unwrap().transform.position, [7.0, 0.5, -1.0]);

        m.pointer_up(&mut nav);
        assert_eq!(m.mode(), InteractionMode::Idle);
        assert!(nav.is_enabled());
    }

    #[test]
    fn test_drag_uses_held_object_height() {
        let (mut m, mut scene, mut nav) = setup();
        let knot = place(&mut m, &mut scene, &mut nav, ShapeKind::TorusKnot, 0.0, 0.0);
        // Selector now on Box; the knot must keep its own rest height
        m.set_shape(ShapeKind::Box, &mut scene);

        let grab = Ray::new(glam::Vec3::new(0.6, 1.0, 5.0), glam::Vec3::NEG_Z);
        m.pointer_down(&grab, &scene, &mut nav);
        assert_eq!(m.mode(), InteractionMode::Dragging { target: knot });
        m.pointer_move(&Ray::down_at(3.0, 3.0), &mut scene);
        assert_eq!(scene.get(knot).unwrap().transform.position, [3.0, 1.0, 3.0]);
    }

    #[test]
    fn test_pointer_down_on_fixture_does_not_drag() {
        let (mut m, mut scene, mut nav) = setup();
        m.pointer_down(&Ray::down_at(1.0, 1.0), &scene, &mut nav);
        assert_eq!(m.mode(), InteractionMode::Idle);
        assert!(nav.is_enabled());
    }

    #[test]
    fn test_pointer_down_while_placing_is_ignored() {
        let (mut m, mut scene, mut nav) = setup();
        place(&mut m, &mut scene, &mut nav, ShapeKind::Box, 0.0, 0.0);
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        m.pointer_down(&Ray::down_at(0.0, 0.0), &scene, &mut nav);
        assert!(m.is_placing());
        assert!(nav.is_enabled());
    }

    #[test]
    fn test_click_selects_placed_object() {
        let (mut m, mut scene, mut nav) = setup();
        let id = place(&mut m, &mut scene, &mut nav, ShapeKind::Sphere, 3.0, 3.0);

        assert_eq!(m.click(&Ray::down_at(3.0, 3.0), &mut scene), Some(id));
        assert_eq!(m.selected(&scene), Some(id));
        assert_eq!(m.take_selection_changes(), vec![Some(id)]);
    }

    #[test]
    fn test_click_on_nothing_keeps_selection() {
        let (mut m, mut scene, mut nav) = setup();
        let id = place(&mut m, &mut scene, &mut nav, ShapeKind::Box, 0.0, 0.0);
        m.click(&Ray::down_at(0.0, 0.0), &mut scene);
        m.take_selection_changes();

        assert!(m.click(&Ray::down_at(8.0, 8.0), &mut scene).is_none());
        assert_eq!(m.selected(&scene), Some(id));
        assert!(m.take_selection_changes().is_empty());
    }

    #[test]
    fn test_double_click_deletes_and_clears_selection() {
        let (mut m, mut scene, mut nav) = setup();
        let id = place(&mut m, &mut scene, &mut nav, ShapeKind::Box, 1.0, 1.0);
        m.click(&Ray::down_at(1.0, 1.0), &mut scene);
        m.take_selection_changes();

        assert_eq!(m.double_click(&Ray::down_at(1.0, 1.0), &mut scene, &mut nav), Some(id));
        assert!(!scene.contains(id));
        assert_eq!(scene.placed_count(), 0);
        assert!(m.selected(&scene).is_none());
        assert_eq!(m.take_selection_changes(), vec![None]);
    }

    #[test]
    fn test_double_click_other_object_keeps_selection() {
        let (mut m, mut scene, mut nav) = setup();
        let a = place(&mut m, &mut scene, &mut nav, ShapeKind::Box, 0.0, 0.0);
        let b = place(&mut m, &mut scene, &mut nav, ShapeKind::Box, 4.0, 0.0);
        m.click(&Ray::down_at(0.0, 0.0), &mut scene);

        m.double_click(&Ray::down_at(4.0, 0.0), &mut scene, &mut nav);
        assert!(!scene.contains(b));
        assert_eq!(m.selected(&scene), Some(a));
    }

    #[test]
    fn test_double_click_on_fixture_is_noop() {
        let (mut m, mut scene, mut nav) = setup();
        let before = scene.len();
        assert!(m.double_click(&Ray::down_at(0.0, 0.0), &mut scene, &mut nav).is_none());
        assert_eq!(scene.len(), before);
    }

    #[test]
    fn test_delete_during_drag_releases_navigation() {
        let (mut m, mut scene, mut nav) = setup();
        let id = place(&mut m, &mut scene, &mut nav, ShapeKind::Box, 0.0, 0.0);
        m.pointer_down(&Ray::down_at(0.0, 0.0), &scene, &mut nav);
        assert!(m.delete(id, &mut scene, &mut nav));
        assert_eq!(m.mode(), InteractionMode::Idle);
        assert!(nav.is_enabled());
        assert!(!m.delete(id, &mut scene, &mut nav));
    }

    #[test]
    fn test_deactivate_ignores_input_and_cleans_up() {
        let (mut m, mut scene, mut nav) = setup();
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        m.pointer_move(&Ray::down_at(0.0, 0.0), &mut scene);
        m.deactivate(&mut scene, &mut nav);
        assert_eq!(scene.ghost_count(), 0);
        assert!(!m.is_active());

        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        assert!(!m.is_placing());

        m.activate();
        m.begin_placement(ShapeKind::Box, &mut scene, &mut nav);
        assert!(m.is_placing());
    }
}
