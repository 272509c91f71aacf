//! Inspector binding: an editable draft of the selected object's material
//! and transform, written back on Apply.

use shared::{Material, PLACED_COLOR};

use crate::state::scene::{NodeId, SceneGraph};
use crate::texture::{TextureQueue, TextureSource};

/// Editable copy of the selected object's properties
#[derive(Debug, Clone, PartialEq)]
pub struct InspectorDraft {
    /// 24-bit RGB
    pub color: u32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    /// Also drives the wireframe flag on apply
    pub transparent: bool,
    pub scale: [f32; 3],
    /// Rotation about Y in degrees
    pub rotation_y_degrees: f32,
}

impl Default for InspectorDraft {
    fn default() -> Self {
        Self {
            color: PLACED_COLOR,
            metalness: 0.5,
            roughness: 0.5,
            opacity: 1.0,
            transparent: false,
            scale: [1.0, 1.0, 1.0],
            rotation_y_degrees: 0.0,
        }
    }
}

impl InspectorDraft {
    /// Material described by the draft. Opacity below 1 forces transparency.
    pub fn to_material(&self) -> Material {
        let transparent = self.transparent || self.opacity < 1.0;
        Material {
            color: self.color,
            metalness: self.metalness,
            roughness: self.roughness,
            opacity: self.opacity,
            transparent,
            wireframe: self.transparent,
            depth_write: !transparent,
        }
    }
}

/// Draft bound to the current selection.
#[derive(Debug, Default)]
pub struct Inspector {
    target: Option<NodeId>,
    pub draft: InspectorDraft,
}

impl Inspector {
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Bound object, if it still exists.
    pub fn live_target(&self, scene: &SceneGraph) -> Option<NodeId> {
        self.target.filter(|id| scene.is_placed(*id))
    }

    /// Selection changed: read the new object into the draft. With no
    /// selection the draft is kept but nothing is bound.
    pub fn reflect(&mut self, selection: Option<NodeId>, scene: &SceneGraph) {
        self.target = selection.filter(|id| scene.is_placed(*id));
        let Some(node) = self.target.and_then(|id| scene.get(id)) else {
            return;
        };

        // A zero component reads back as 1, as an unset field would
        let scale = node.transform.scale.map(|s| if s == 0.0 { 1.0 } else { s });
        self.draft = InspectorDraft {
            color: node.material.color,
            metalness: node.material.metalness,
            roughness: node.material.roughness,
            opacity: node.material.opacity,
            transparent: node.material.transparent,
            scale,
            rotation_y_degrees: node.transform.rotation[1].to_degrees(),
        };
    }

    /// Write the draft onto the bound object. No-op without a live target.
    pub fn apply(&self, scene: &mut SceneGraph) -> bool {
        let Some(id) = self.live_target(scene) else {
            return false;
        };
        let Some(node) = scene.get(id) else {
            return false;
        };

        let material = self.draft.to_material();
        let mut transform = node.transform;
        transform.scale = self.draft.scale;
        // X and Z rotation are not edited here and pass through untouched
        transform.rotation[1] = self.draft.rotation_y_degrees.to_radians();

        scene.set_material(id, material);
        scene.set_transform(id, transform);
        tracing::debug!("Applied inspector edits to {:?}", id);
        true
    }

    /// Queue a texture for the bound object. Decoding finishes later.
    pub fn upload_texture(&self, source: TextureSource, scene: &SceneGraph, textures: &mut TextureQueue) -> bool {
        let Some(id) = self.live_target(scene) else {
            return false;
        };
        tracing::info!("Loading texture {}", source.locator());
        textures.request(id, source);
        true
    }
}
