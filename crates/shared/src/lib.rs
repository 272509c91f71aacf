//! Data types shared by the scene builder, its wasm facade and the export format.

use serde::{Deserialize, Serialize};

// ============================================================================
// Shapes
// ============================================================================

/// Primitive shape kinds that can be placed on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Box,
    Sphere,
    Cylinder,
    TorusKnot,
}

impl ShapeKind {
    /// All shapes in selector order.
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Cylinder,
        ShapeKind::TorusKnot,
    ];

    /// Height above the ground at which a placed shape rests.
    pub fn rest_height(self) -> f32 {
        match self {
            ShapeKind::TorusKnot => 1.0,
            ShapeKind::Box | ShapeKind::Sphere | ShapeKind::Cylinder => 0.5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Box => "Box",
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Cylinder => "Cylinder",
            ShapeKind::TorusKnot => "Torus Knot",
        }
    }

    /// Serialized tag, as used in exported records.
    pub fn tag(self) -> &'static str {
        match self {
            ShapeKind::Box => "box",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cylinder => "cylinder",
            ShapeKind::TorusKnot => "torusknot",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.tag() == tag)
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Position, Euler rotation (XYZ order, radians) and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }
}

// ============================================================================
// Material
// ============================================================================

/// Colour of a freshly placed object.
pub const PLACED_COLOR: u32 = 0xff88aa;
/// Colour of the translucent placement preview.
pub const PREVIEW_COLOR: u32 = 0x8888ff;
pub const PREVIEW_OPACITY: f32 = 0.5;

/// Physically based surface parameters of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// 24-bit RGB
    pub color: u32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub wireframe: bool,
    #[serde(default = "default_true")]
    pub depth_write: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Material {
    fn default() -> Self {
        Self::placed()
    }
}

impl Material {
    /// Opaque material given to committed objects.
    pub fn placed() -> Self {
        Self {
            color: PLACED_COLOR,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transparent: false,
            wireframe: false,
            depth_write: true,
        }
    }

    /// Translucent material of the placement preview.
    pub fn preview() -> Self {
        Self {
            color: PREVIEW_COLOR,
            opacity: PREVIEW_OPACITY,
            transparent: true,
            ..Self::placed()
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        [
            ((self.color >> 16) & 0xff) as u8,
            ((self.color >> 8) & 0xff) as u8,
            (self.color & 0xff) as u8,
        ]
    }
}

/// Parse `#rrggbb` (leading `#` optional) into a 24-bit colour.
pub fn parse_hex_color(s: &str) -> Option<u32> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Format a 24-bit colour as `#rrggbb`.
pub fn format_hex_color(color: u32) -> String {
    format!("#{:06x}", color & 0xff_ffff)
}

// ============================================================================
// Export records
// ============================================================================

/// Material fields written into an exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub color: u32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub wireframe: bool,
    /// Static image locator, relative to the document or absolute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
}

impl MaterialRecord {
    pub fn from_material(material: &Material, map: Option<String>) -> Self {
        Self {
            color: material.color,
            metalness: material.metalness,
            roughness: material.roughness,
            opacity: material.opacity,
            transparent: material.transparent,
            wireframe: material.wireframe,
            map,
        }
    }

    pub fn to_material(&self) -> Material {
        Material {
            color: self.color,
            metalness: self.metalness,
            roughness: self.roughness,
            opacity: self.opacity,
            transparent: self.transparent,
            wireframe: self.wireframe,
            depth_write: !self.transparent,
        }
    }
}

/// One placed object as stored in an exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub shape: ShapeKind,
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub rotation: [f32; 3],
    pub material: MaterialRecord,
}

impl ObjectRecord {
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_tags_roundtrip() {
        for shape in ShapeKind::ALL {
            assert_eq!(ShapeKind::from_tag(shape.tag()), Some(shape));
            let json = serde_json::to_string(&shape).unwrap();
            assert_eq!(json, format!("\"{}\"", shape.tag()));
        }
        assert_eq!(ShapeKind::from_tag("cone"), None);
    }

    #[test]
    fn test_rest_heights() {
        assert_eq!(ShapeKind::Box.rest_height(), 0.5);
        assert_eq!(ShapeKind::Sphere.rest_height(), 0.5);
        assert_eq!(ShapeKind::Cylinder.rest_height(), 0.5);
        assert_eq!(ShapeKind::TorusKnot.rest_height(), 1.0);
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_hex_color("#112233"), Some(0x112233));
        assert_eq!(parse_hex_color("ff88aa"), Some(0xff88aa));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(format_hex_color(0x112233), "#112233");
        assert_eq!(format_hex_color(0x0000ff), "#0000ff");
    }

    #[test]
    fn test_material_defaults() {
        let placed = Material::placed();
        assert_eq!(placed.color, PLACED_COLOR);
        assert!(!placed.transparent);
        assert_eq!(placed.rgb(), [0xff, 0x88, 0xaa]);

        let preview = Material::preview();
        assert_eq!(preview.color, PREVIEW_COLOR);
        assert!(preview.transparent);
        assert_eq!(preview.opacity, 0.5);
    }

    #[test]
    fn test_record_without_map_omits_field() {
        let record = MaterialRecord::from_material(&Material::placed(), None);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("map").is_none());

        let parsed: MaterialRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.map, None);
    }
}
