use std::f32::consts::{PI, TAU};
use std::sync::OnceLock;

use glam::Vec3;
use shared::ShapeKind;

/// Floats per vertex: position(3) + normal(3)
pub const STRIDE: usize = 6;

/// CPU-side mesh data: interleaved [pos.x, pos.y, pos.z, norm.x, norm.y, norm.z]
#[derive(Clone, Debug)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let base = index * STRIDE;
        Vec3::new(
            self.vertices[base],
            self.vertices[base + 1],
            self.vertices[base + 2],
        )
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        let base = index * STRIDE + 3;
        Vec3::new(
            self.vertices[base],
            self.vertices[base + 1],
            self.vertices[base + 2],
        )
    }

    /// Corner positions of a triangle.
    pub fn triangle(&self, tri: usize) -> [Vec3; 3] {
        let i0 = self.indices[tri * 3] as usize;
        let i1 = self.indices[tri * 3 + 1] as usize;
        let i2 = self.indices[tri * 3 + 2] as usize;
        [self.position(i0), self.position(i1), self.position(i2)]
    }

    /// Unique edges (index pairs) for wireframe drawing.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        let mut edges: Vec<(u32, u32)> = self
            .indices
            .chunks_exact(3)
            .flat_map(|t| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }
}

/// Geometry for a shape kind, built once and shared by picking and drawing.
pub fn shape_mesh(shape: ShapeKind) -> &'static MeshData {
    static BOX: OnceLock<MeshData> = OnceLock::new();
    static SPHERE: OnceLock<MeshData> = OnceLock::new();
    static CYLINDER: OnceLock<MeshData> = OnceLock::new();
    static TORUS_KNOT: OnceLock<MeshData> = OnceLock::new();

    match shape {
        ShapeKind::Box => BOX.get_or_init(|| cube(1.0, 1.0, 1.0)),
        ShapeKind::Sphere => SPHERE.get_or_init(|| sphere(0.5, 32, 32)),
        ShapeKind::Cylinder => CYLINDER.get_or_init(|| cylinder(0.5, 1.0, 32)),
        ShapeKind::TorusKnot => TORUS_KNOT.get_or_init(|| torus_knot(0.4, 0.15, 100, 16, 2, 3)),
    }
}

// ── Primitive generation ─────────────────────────────────────

pub fn cube(w: f32, h: f32, d: f32) -> MeshData {
    let hw = w * 0.5;
    let hh = h * 0.5;
    let hd = d * 0.5;

    let faces: [([Vec3; 4], Vec3); 6] = [
        // Front (+Z)
        ([Vec3::new(-hw, -hh, hd), Vec3::new(hw, -hh, hd), Vec3::new(hw, hh, hd), Vec3::new(-hw, hh, hd)], Vec3::Z),
        // Back (-Z)
        ([Vec3::new(hw, -hh, -hd), Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, hh, -hd), Vec3::new(hw, hh, -hd)], Vec3::NEG_Z),
        // Right (+X)
        ([Vec3::new(hw, -hh, hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, hh, -hd), Vec3::new(hw, hh, hd)], Vec3::X),
        // Left (-X)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, -hh, hd), Vec3::new(-hw, hh, hd), Vec3::new(-hw, hh, -hd)], Vec3::NEG_X),
        // Top (+Y)
        ([Vec3::new(-hw, hh, hd), Vec3::new(hw, hh, hd), Vec3::new(hw, hh, -hd), Vec3::new(-hw, hh, -hd)], Vec3::Y),
        // Bottom (-Y)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, -hh, hd), Vec3::new(-hw, -hh, hd)], Vec3::NEG_Y),
    ];

    let mut vertices = Vec::with_capacity(24 * STRIDE);
    let mut indices = Vec::with_capacity(36);

    for (quad, normal) in &faces {
        let base = (vertices.len() / STRIDE) as u32;
        for v in quad {
            push_vert(&mut vertices, *v, *normal);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

pub fn cylinder(radius: f32, height: f32, segments: u32) -> MeshData {
    let hh = height * 0.5;
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    // Side faces
    for i in 0..segments {
        let a0 = (i as f32) * TAU / segments as f32;
        let a1 = ((i + 1) as f32) * TAU / segments as f32;

        let (s0, c0) = a0.sin_cos();
        let (s1, c1) = a1.sin_cos();

        let n0 = Vec3::new(c0, 0.0, s0);
        let n1 = Vec3::new(c1, 0.0, s1);

        let base = (vertices.len() / STRIDE) as u32;

        push_vert(&mut vertices, Vec3::new(radius * c0, -hh, radius * s0), n0);
        push_vert(&mut vertices, Vec3::new(radius * c1, -hh, radius * s1), n1);
        push_vert(&mut vertices, Vec3::new(radius * c1, hh, radius * s1), n1);
        push_vert(&mut vertices, Vec3::new(radius * c0, hh, radius * s0), n0);

        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    add_cap(&mut vertices, &mut indices, radius, hh, segments, Vec3::Y);
    add_cap(&mut vertices, &mut indices, radius, -hh, segments, Vec3::NEG_Y);

    MeshData { vertices, indices }
}

/// UV sphere; `width_segments` around Y, `height_segments` from pole to pole.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for r in 0..=height_segments {
        let phi = PI * r as f32 / height_segments as f32;
        let (sp, cp) = phi.sin_cos();

        for s in 0..=width_segments {
            let theta = TAU * s as f32 / width_segments as f32;
            let (st, ct) = theta.sin_cos();

            let n = Vec3::new(-ct * sp, cp, st * sp);
            push_vert(&mut vertices, n * radius, n);
        }
    }

    let row = width_segments + 1;
    for r in 0..height_segments {
        for s in 0..width_segments {
            let i0 = r * row + s;
            let i1 = i0 + 1;
            let i2 = i0 + row;
            let i3 = i2 + 1;
            // The pole rows collapse one triangle of each quad to a point
            if r != 0 {
                indices.extend_from_slice(&[i1, i0, i3]);
            }
            if r != height_segments - 1 {
                indices.extend_from_slice(&[i0, i2, i3]);
            }
        }
    }

    MeshData { vertices, indices }
}

/// (p, q) torus knot swept by a circular tube.
pub fn torus_knot(radius: f32, tube: f32, tubular_segments: u32, radial_segments: u32, p: u32, q: u32) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let (p, q) = (p as f32, q as f32);

    let curve = |u: f32| -> Vec3 {
        let qu_over_p = q / p * u;
        let cs = qu_over_p.cos();
        Vec3::new(
            radius * (2.0 + cs) * 0.5 * u.cos(),
            radius * (2.0 + cs) * 0.5 * u.sin(),
            radius * qu_over_p.sin() * 0.5,
        )
    };

    for i in 0..=tubular_segments {
        let u = i as f32 / tubular_segments as f32 * p * TAU;
        let p1 = curve(u);
        let p2 = curve(u + 0.01);

        // Frenet-like frame along the curve
        let t = p2 - p1;
        let n = p2 + p1;
        let b = t.cross(n).normalize_or_zero();
        let n = b.cross(t).normalize_or_zero();

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            let pos = p1 + n * cx + b * cy;
            push_vert(&mut vertices, pos, (pos - p1).normalize_or_zero());
        }
    }

    let row = radial_segments + 1;
    for j in 1..=tubular_segments {
        for i in 1..=radial_segments {
            let a = row * (j - 1) + (i - 1);
            let b = row * j + (i - 1);
            let c = row * j + i;
            let d = row * (j - 1) + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    MeshData { vertices, indices }
}

// ── Helpers ──────────────────────────────────────────────────

fn push_vert(v: &mut Vec<f32>, pos: Vec3, n: Vec3) {
    v.extend_from_slice(&[pos.x, pos.y, pos.z, n.x, n.y, n.z]);
}

fn add_cap(
    vertices: &mut Vec<f32>,
    indices: &mut Vec<u32>,
    radius: f32,
    y: f32,
    segments: u32,
    normal: Vec3,
) {
    let center_idx = (vertices.len() / STRIDE) as u32;
    push_vert(vertices, Vec3::new(0.0, y, 0.0), normal);

    for i in 0..segments {
        let angle = (i as f32) * TAU / segments as f32;
        push_vert(vertices, Vec3::new(radius * angle.cos(), y, radius * angle.sin()), normal);
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        if normal.y >= 0.0 {
            indices.extend_from_slice(&[center_idx, center_idx + 1 + i, center_idx + 1 + next]);
        } else {
            indices.extend_from_slice(&[center_idx, center_idx + 1 + next, center_idx + 1 + i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_meshes_are_cached() {
        let a = shape_mesh(ShapeKind::Sphere) as *const MeshData;
        let b = shape_mesh(ShapeKind::Sphere) as *const MeshData;
        assert_eq!(a, b);
    }

    #[test]
    fn test_edges_are_unique() {
        let mesh = cube(1.0, 1.0, 1.0);
        let edges = mesh.edges();
        // 12 box edges + 6 face diagonals
        assert_eq!(edges.len(), 18);
    }

    #[test]
    fn test_torus_knot_counts() {
        let mesh = torus_knot(0.4, 0.15, 100, 16, 2, 3);
        assert_eq!(mesh.vertex_count(), 101 * 17);
        assert_eq!(mesh.triangle_count(), 100 * 16 * 2);
    }
}
