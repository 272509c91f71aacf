//! Sanity checks for the primitive meshes behind placed shapes.
//!
//! Buffer layout problems would break picking and the painter; the shape
//! checks catch primitives that would float above or sink into the ground
//! after grid snapping, or that would be culled from the wrong side.

use shared::ShapeKind;

use crate::viewport::mesh::{shape_mesh, MeshData, STRIDE};
use crate::viewport::picking::Aabb;

/// Ground contact tolerance in world units
const CONTACT_EPSILON: f32 = 1e-3;

/// A problem found in a mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshIssue {
    #[error("vertex buffer length {len} is not a multiple of {STRIDE}")]
    VertexStride { len: usize },
    #[error("index buffer length {len} is not a multiple of 3")]
    IndexStride { len: usize },
    #[error("{count} indices reach past vertex {vertex_count}")]
    IndexOutOfRange { count: usize, vertex_count: usize },
    #[error("{count} normals are not unit length")]
    NormalLength { count: usize },
    #[error("{count} degenerate triangles")]
    Degenerate { count: usize },
    #[error("{count} normals point into the shape")]
    InwardNormals { count: usize },
    #[error("base sits at y={base} but the snap height puts it at y={expected}")]
    GroundContact { base: f32, expected: f32 },
}

pub struct MeshValidator<'a> {
    mesh: &'a MeshData,
}

impl<'a> MeshValidator<'a> {
    pub fn new(mesh: &'a MeshData) -> Self {
        Self { mesh }
    }

    pub fn dimensions(&self) -> [f32; 3] {
        Aabb::from_mesh(self.mesh).size().to_array()
    }

    /// Whether every bounding extent is within `tolerance` of `expected`.
    pub fn dimensions_match(&self, expected: [f32; 3], tolerance: f32) -> bool {
        self.dimensions().iter().zip(expected).all(|(got, want)| (got - want).abs() < tolerance)
    }

    /// Layout problems: strides, index range, normal length, zero-area triangles.
    pub fn validate_all(&self) -> Vec<MeshIssue> {
        let mesh = self.mesh;
        let mut issues = Vec::new();

        if mesh.vertices.len() % STRIDE != 0 {
            issues.push(MeshIssue::VertexStride { len: mesh.vertices.len() });
        }
        if mesh.indices.len() % 3 != 0 {
            issues.push(MeshIssue::IndexStride { len: mesh.indices.len() });
        }

        let vertex_count = mesh.vertex_count();
        let out_of_range = mesh.indices.iter().filter(|&&i| i as usize >= vertex_count).count();
        if out_of_range > 0 {
            issues.push(MeshIssue::IndexOutOfRange { count: out_of_range, vertex_count });
        }

        let bad_normals = (0..vertex_count)
            .filter(|&i| (mesh.normal(i).length() - 1.0).abs() > 0.1)
            .count();
        if bad_normals > 0 {
            issues.push(MeshIssue::NormalLength { count: bad_normals });
        }

        // Triangle checks read positions through the indices
        if issues.is_empty() {
            let degenerate = self.degenerate_triangles(1e-9);
            if degenerate > 0 {
                issues.push(MeshIssue::Degenerate { count: degenerate });
            }
        }

        issues
    }

    /// Triangles whose area is below `min_area`.
    pub fn degenerate_triangles(&self, min_area: f32) -> usize {
        (0..self.mesh.triangle_count())
            .filter(|&tri| {
                let [a, b, c] = self.mesh.triangle(tri);
                (b - a).cross(c - a).length() * 0.5 < min_area
            })
            .count()
    }

    /// Vertices whose normal faces the bounding box centre.
    ///
    /// Only meaningful for shapes that are star-shaped around their centre.
    pub fn inward_normals(&self) -> usize {
        let center = Aabb::from_mesh(self.mesh).center();
        (0..self.mesh.vertex_count())
            .filter(|&i| self.mesh.normal(i).dot(self.mesh.position(i) - center) < -1e-4)
            .count()
    }

    /// Height of the lowest vertex above the ground once `shape` is lifted
    /// to its snap height.
    pub fn ground_gap(&self, shape: ShapeKind) -> f32 {
        Aabb::from_mesh(self.mesh).min.y + shape.rest_height()
    }
}

/// Layout checks plus the shape-level ones for a primitive.
///
/// The torus knot is exempt from both shape checks: it keeps its historical
/// snap height, so it hovers, and its tube wraps around the centre.
pub fn validate_shape(shape: ShapeKind) -> Vec<MeshIssue> {
    let validator = MeshValidator::new(shape_mesh(shape));
    let mut issues = validator.validate_all();
    if !issues.is_empty() || shape == ShapeKind::TorusKnot {
        return issues;
    }

    let inward = validator.inward_normals();
    if inward > 0 {
        issues.push(MeshIssue::InwardNormals { count: inward });
    }
    let gap = validator.ground_gap(shape);
    if gap.abs() > CONTACT_EPSILON {
        issues.push(MeshIssue::GroundContact { base: gap, expected: 0.0 });
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData {
            vertices: vec![
                0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
                0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
            ],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_clean_triangle() {
        assert!(MeshValidator::new(&triangle()).validate_all().is_empty());
    }

    #[test]
    fn test_bad_stride_stops_triangle_checks() {
        let bad = MeshData { vertices: vec![0.0; 10], indices: vec![0, 1, 2] };
        let issues = MeshValidator::new(&bad).validate_all();
        assert!(issues.contains(&MeshIssue::VertexStride { len: 10 }));
        assert!(!issues.iter().any(|i| matches!(i, MeshIssue::Degenerate { .. })));
        assert_eq!(issues[0].to_string(), "vertex buffer length 10 is not a multiple of 6");
    }

    #[test]
    fn test_index_out_of_range() {
        let bad = MeshData { vertices: vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0], indices: vec![0, 1, 2] };
        let issues = MeshValidator::new(&bad).validate_all();
        assert!(issues.contains(&MeshIssue::IndexOutOfRange { count: 2, vertex_count: 1 }));
    }

    #[test]
    fn test_long_normal() {
        let bad = MeshData { vertices: vec![0.0, 0.0, 0.0, 0.0, 0.0, 5.0], indices: vec![] };
        assert_eq!(MeshValidator::new(&bad).validate_all(), vec![MeshIssue::NormalLength { count: 1 }]);
    }

    #[test]
    fn test_collapsed_triangle() {
        let mut mesh = triangle();
        mesh.vertices[12] = 1.0;
        mesh.vertices[13] = 0.0;
        assert_eq!(MeshValidator::new(&mesh).validate_all(), vec![MeshIssue::Degenerate { count: 1 }]);
    }

    #[test]
    fn test_flipped_normals_detected() {
        let mut mesh = crate::viewport::mesh::cube(1.0, 1.0, 1.0);
        for v in mesh.vertices.chunks_mut(STRIDE) {
            for n in &mut v[3..6] {
                *n = -*n;
            }
        }
        assert_eq!(MeshValidator::new(&mesh).inward_normals(), 24);
    }

    #[test]
    fn test_every_shape_validates() {
        for shape in ShapeKind::ALL {
            let issues = validate_shape(shape);
            assert!(issues.is_empty(), "{}: {:?}", shape.label(), issues);
        }
    }

    #[test]
    fn test_unit_shapes_rest_on_ground() {
        for shape in [ShapeKind::Box, ShapeKind::Sphere, ShapeKind::Cylinder] {
            let v = MeshValidator::new(shape_mesh(shape));
            assert!(v.dimensions_match([1.0, 1.0, 1.0], 1e-3), "{}", shape.label());
            assert!(v.ground_gap(shape).abs() < CONTACT_EPSILON);
        }
    }

    #[test]
    fn test_torus_knot_hovers() {
        let v = MeshValidator::new(shape_mesh(ShapeKind::TorusKnot));
        assert!(v.ground_gap(ShapeKind::TorusKnot) > 0.1);
    }
}
