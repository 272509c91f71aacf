//! Scene graph store
//!
//! Owns every node in the scene (fixtures, the placement preview and placed
//! objects) together with their render resources. Node ids are generation
//! counted: an id kept after its node was removed never resolves again.

mod display;
mod fixtures;

pub use display::{node_display_name, node_from_script_id, script_id, short_id};

use slotmap::SlotMap;

use shared::{Material, ShapeKind, Transform};

use crate::render::{GeometryHandle, GeometrySpec, MaterialHandle, RenderBackend, ResourceCounts};
use crate::state::settings::GridSettings;
use crate::texture::TextureRef;

slotmap::new_key_type! {
    /// Generation-counted handle to a scene node.
    pub struct NodeId;
}

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Ground { size: f32 },
    Grid { size: f32, divisions: u32 },
    DirectionalLight { intensity: f32 },
    AmbientLight { intensity: f32 },
    /// Translucent placement preview
    Ghost(ShapeKind),
    /// User-placed object
    Placed(ShapeKind),
}

impl NodeKind {
    pub fn shape(&self) -> Option<ShapeKind> {
        match self {
            NodeKind::Ghost(shape) | NodeKind::Placed(shape) => Some(*shape),
            _ => None,
        }
    }

    fn geometry_spec(&self) -> Option<GeometrySpec> {
        match *self {
            NodeKind::Ground { size } => Some(GeometrySpec::Plane { size }),
            NodeKind::Grid { size, divisions } => Some(GeometrySpec::Grid { size, divisions }),
            NodeKind::Ghost(shape) | NodeKind::Placed(shape) => Some(GeometrySpec::Shape(shape)),
            NodeKind::DirectionalLight { .. } | NodeKind::AmbientLight { .. } => None,
        }
    }

    /// Only nodes with a surface get a material.
    fn has_surface(&self) -> bool {
        matches!(
            self,
            NodeKind::Ground { .. } | NodeKind::Ghost(_) | NodeKind::Placed(_)
        )
    }
}

/// A node in the scene graph.
#[derive(Debug)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub transform: Transform,
    pub material: Material,
    pub texture: Option<TextureRef>,
    geometry: Option<GeometryHandle>,
    material_handle: Option<MaterialHandle>,
}

impl SceneNode {
    /// Placed objects are the only ones that can be selected, dragged,
    /// deleted or exported.
    pub fn is_placed(&self) -> bool {
        matches!(self.kind, NodeKind::Placed(_))
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self.kind, NodeKind::Ghost(_))
    }

    pub fn shape(&self) -> Option<ShapeKind> {
        self.kind.shape()
    }

    pub fn geometry(&self) -> Option<GeometryHandle> {
        self.geometry
    }

    pub fn material_handle(&self) -> Option<MaterialHandle> {
        self.material_handle
    }
}

/// All scene nodes plus the backend holding their resources.
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    /// Insertion order, used for traversal and export
    order: Vec<NodeId>,
    backend: Box<dyn RenderBackend>,
    /// Monotonically increasing version counter, bumped on every mutation
    version: u64,
}

impl SceneGraph {
    /// Empty graph without fixtures.
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            order: Vec::new(),
            backend,
            version: 0,
        }
    }

    /// Graph with ground, grid and lights.
    pub fn with_fixtures(backend: Box<dyn RenderBackend>, grid: &GridSettings) -> Self {
        let mut scene = Self::new(backend);
        fixtures::install(&mut scene, grid);
        scene
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn resources(&self) -> ResourceCounts {
        self.backend.resources()
    }

    // ── Add / remove ─────────────────────────────────────────

    /// Add a node, creating its geometry and material.
    pub fn add(&mut self, kind: NodeKind, transform: Transform, material: Material) -> NodeId {
        let geometry = kind.geometry_spec().map(|spec| self.backend.create_geometry(spec));
        let material_handle = kind
            .has_surface()
            .then(|| self.backend.create_material(&material));

        let id = self.nodes.insert(SceneNode {
            kind,
            transform,
            material,
            texture: None,
            geometry,
            material_handle,
        });
        self.order.push(id);
        self.version += 1;
        id
    }

    pub fn add_placed(&mut self, shape: ShapeKind, transform: Transform, material: Material) -> NodeId {
        self.add(NodeKind::Placed(shape), transform, material)
    }

    /// Remove a node and release its resources. Returns false if the id is stale.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(mut node) = self.nodes.remove(id) else {
            return false;
        };
        self.release(&mut node);
        self.order.retain(|n| *n != id);
        self.version += 1;
        true
    }

    /// Dispose geometry and material. Handles are taken, so a second call
    /// finds nothing to release.
    fn release(&mut self, node: &mut SceneNode) {
        if let Some(geometry) = node.geometry.take() {
            self.backend.dispose_geometry(geometry);
        }
        if let Some(material) = node.material_handle.take() {
            self.backend.dispose_material(material);
        }
        // Drops any uploaded texture bytes with the node
        node.texture = None;
    }

    /// Remove every placed object, keeping fixtures.
    pub fn clear_placed(&mut self) -> usize {
        let placed: Vec<NodeId> = self.placed().map(|(id, _)| id).collect();
        for id in &placed {
            self.remove(*id);
        }
        placed.len()
    }

    // ── Lookup / traversal ───────────────────────────────────

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// True when `id` is live and refers to a placed object.
    pub fn is_placed(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(SceneNode::is_placed)
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(*id).map(|n| (*id, n)))
    }

    /// Placed objects in insertion order.
    pub fn placed(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.iter().filter(|(_, n)| n.is_placed())
    }

    pub fn placed_count(&self) -> usize {
        self.placed().count()
    }

    pub fn ghost_count(&self) -> usize {
        self.iter().filter(|(_, n)| n.is_ghost()).count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Mutation ─────────────────────────────────────────────

    pub fn set_position(&mut self, id: NodeId, position: [f32; 3]) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.transform.position = position;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.transform = transform;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    /// Replace a node's material parameters and push them to the backend.
    pub fn set_material(&mut self, id: NodeId, material: Material) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.material = material;
        if let Some(handle) = node.material_handle {
            self.backend.update_material(handle, &node.material, node.texture.as_ref());
        }
        self.version += 1;
        true
    }

    /// Bind or clear a texture. Returns false when the node is gone or has
    /// no surface to show it on.
    pub fn set_texture(&mut self, id: NodeId, texture: Option<TextureRef>) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let Some(handle) = node.material_handle else {
            return false;
        };
        node.texture = texture;
        self.backend.update_material(handle, &node.material, node.texture.as_ref());
        self.version += 1;
        true
    }
}

impl Drop for SceneGraph {
    fn drop(&mut self) {
        let ids: Vec<NodeId> = self.order.drain(..).collect();
        for id in ids {
            if let Some(mut node) = self.nodes.remove(id) {
                self.release(&mut node);
            }
        }
    }
}
