//! Display helpers for scene nodes

use slotmap::{Key, KeyData};

use super::{NodeId, NodeKind, SceneNode};

/// Get display name for a node
pub fn node_display_name(id: NodeId, node: &SceneNode) -> String {
    let kind = match node.kind {
        NodeKind::Ground { .. } => "Ground",
        NodeKind::Grid { .. } => "Grid",
        NodeKind::DirectionalLight { .. } => "Sun",
        NodeKind::AmbientLight { .. } => "Ambient",
        NodeKind::Ghost(shape) => return format!("{} preview", shape.label()),
        NodeKind::Placed(shape) => shape.label(),
    };
    format!("{} #{}", kind, short_id(id))
}

/// Short numeric id for display (slot index, without the generation)
pub fn short_id(id: NodeId) -> u32 {
    (id.data().as_ffi() & 0xffff_ffff) as u32
}

/// Id handed to scripts and the browser host. Carries the slot generation,
/// so an id kept past a delete never resolves to a later object in the
/// same slot. Fits in 53 bits until a slot is reused about a million times.
pub fn script_id(id: NodeId) -> u64 {
    id.data().as_ffi()
}

/// Inverse of [`script_id`]. The result may be stale; look it up before use.
pub fn node_from_script_id(value: u64) -> NodeId {
    NodeId::from(KeyData::from_ffi(value))
}
