//! Ray picking against the ground plane and scene nodes, plus grid snapping.
//!
//! Every query is read-only.

use glam::{EulerRot, Mat4, Quat, Vec3};
use shared::{ShapeKind, Transform};

use super::mesh::{shape_mesh, MeshData};
use crate::state::scene::{NodeId, NodeKind, SceneGraph};

/// Height of the vertical probe rays cast by [`Ray::down_at`]
const PROBE_HEIGHT: f32 = 50.0;

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Straight-down ray hitting the ground at (x, z).
    pub fn down_at(x: f32, z: f32) -> Self {
        Self::new(Vec3::new(x, PROBE_HEIGHT, z), Vec3::NEG_Y)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A ray hit on a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    pub point: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Compute AABB from mesh positions
    pub fn from_mesh(data: &MeshData) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);

        for i in 0..data.vertex_count() {
            let p = data.position(i);
            min = min.min(p);
            max = max.max(p);
        }

        Self { min, max }
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }
}

/// Model matrix of a transform (Euler XYZ order).
pub fn model_matrix(t: &Transform) -> Mat4 {
    let [rx, ry, rz] = t.rotation;
    Mat4::from_scale_rotation_translation(
        Vec3::from(t.scale),
        Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
        Vec3::from(t.position),
    )
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = ray.direction.recip();

    let t1 = (aabb.min.x - ray.origin.x) * inv_dir.x;
    let t2 = (aabb.max.x - ray.origin.x) * inv_dir.x;
    let t3 = (aabb.min.y - ray.origin.y) * inv_dir.y;
    let t4 = (aabb.max.y - ray.origin.y) * inv_dir.y;
    let t5 = (aabb.min.z - ray.origin.z) * inv_dir.z;
    let t6 = (aabb.max.z - ray.origin.z) * inv_dir.z;

    let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Möller-Trumbore ray-triangle intersection algorithm.
/// Returns the distance along the ray if hit, or None if no intersection.
/// Both faces count as hits.
pub fn ray_triangle_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    // Intersection is behind ray origin
    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

/// Nearest triangle hit in a mesh, as a distance along the ray.
pub fn pick_triangle(ray: &Ray, mesh: &MeshData) -> Option<f32> {
    let mut best: Option<f32> = None;

    for tri in 0..mesh.triangle_count() {
        let [v0, v1, v2] = mesh.triangle(tri);
        if let Some(dist) = ray_triangle_intersect(ray, v0, v1, v2) {
            if best.is_none_or(|b| dist < b) {
                best = Some(dist);
            }
        }
    }

    best
}

/// Ray against the horizontal plane `y = height`, limited to a square of
/// side `size` centred on the origin.
fn ray_ground_square(ray: &Ray, height: f32, size: f32) -> Option<f32> {
    if ray.direction.y.abs() < 1e-7 {
        return None;
    }
    let t = (height - ray.origin.y) / ray.direction.y;
    if t <= 0.0 {
        return None;
    }
    let p = ray.at(t);
    let half = size * 0.5;
    (p.x.abs() <= half && p.z.abs() <= half).then_some(t)
}

/// Ray against a shape placed with `transform`, tested in the shape's local space.
fn ray_shape(ray: &Ray, shape: ShapeKind, transform: &Transform) -> Option<f32> {
    let model = model_matrix(transform);
    // Zero scale collapses the shape; nothing to hit
    if model.determinant().abs() < 1e-12 {
        return None;
    }
    let inv = model.inverse();
    // Direction is left unnormalized so local `t` equals world distance
    let local = Ray {
        origin: inv.transform_point3(ray.origin),
        direction: inv.transform_vector3(ray.direction),
    };

    let mesh = shape_mesh(shape);
    ray_aabb(&local, &Aabb::from_mesh(mesh))?;
    pick_triangle(&local, mesh)
}

/// Query (a): the ground plane only. At most one hit.
pub fn pick_ground(ray: &Ray, scene: &SceneGraph) -> Option<Hit> {
    scene.iter().find_map(|(id, node)| match node.kind {
        NodeKind::Ground { size } => {
            let height = node.transform.position[1];
            ray_ground_square(ray, height, size).map(|distance| Hit {
                node: id,
                point: ray.at(distance),
                distance,
            })
        }
        _ => None,
    })
}

/// Query (b): every node the ray passes through, nearest first. Fixtures
/// and the preview are included; callers filter for placed objects.
pub fn pick_objects(ray: &Ray, scene: &SceneGraph) -> Vec<Hit> {
    let mut hits: Vec<Hit> = scene
        .iter()
        .filter_map(|(id, node)| {
            let distance = match node.kind {
                NodeKind::Ground { size } | NodeKind::Grid { size, .. } => {
                    ray_ground_square(ray, node.transform.position[1], size)
                }
                NodeKind::Ghost(shape) | NodeKind::Placed(shape) => {
                    ray_shape(ray, shape, &node.transform)
                }
                NodeKind::DirectionalLight { .. } | NodeKind::AmbientLight { .. } => None,
            }?;
            Some(Hit {
                node: id,
                point: ray.at(distance),
                distance,
            })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Nearest placed object under the ray.
pub fn pick_placed(ray: &Ray, scene: &SceneGraph) -> Option<Hit> {
    pick_objects(ray, scene)
        .into_iter()
        .find(|hit| scene.is_placed(hit.node))
}

/// Round half up, so -2.5 snaps to -2 like 2.5 snaps to 3.
fn round_to_cell(v: f32) -> f32 {
    (v + 0.5).floor()
}

/// Resting position of `shape` on the grid cell nearest to a ground hit.
pub fn snap_to_grid(hit: Vec3, shape: ShapeKind) -> [f32; 3] {
    [round_to_cell(hit.x), shape.rest_height(), round_to_cell(hit.z)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;
    use crate::state::settings::GridSettings;
    use shared::Material;

    fn scene() -> SceneGraph {
        SceneGraph::with_fixtures(Box::new(HeadlessBackend::new()), &GridSettings::default())
    }

    #[test]
    fn test_snap_rounds_horizontal_and_fixes_height() {
        assert_eq!(snap_to_grid(Vec3::new(2.4, 0.0, 1.6), ShapeKind::Box), [2.0, 0.5, 2.0]);
        assert_eq!(snap_to_grid(Vec3::new(-0.6, 3.0, 7.49), ShapeKind::TorusKnot), [-1.0, 1.0, 7.0]);
        assert_eq!(snap_to_grid(Vec3::new(2.5, 0.0, -2.5), ShapeKind::Sphere), [3.0, 0.5, -2.0]);
    }

    #[test]
    fn test_ray_aabb_hit_and_miss() {
        let aabb = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let hit = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((ray_aabb(&hit, &aabb).unwrap() - 4.0).abs() < 1e-5);

        let miss = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(ray_aabb(&miss, &aabb).is_none());
    }

    #[test]
    fn test_ray_triangle() {
        let ray = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::NEG_Z);
        let t = ray_triangle_intersect(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        assert!((t - 1.0).abs() < 1e-6);

        let behind = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::Z);
        assert!(ray_triangle_intersect(&behind, Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn test_pick_ground_single_hit() {
        let scene = scene();
        let hit = pick_ground(&Ray::down_at(2.4, 1.6), &scene).unwrap();
        assert!((hit.point.x - 2.4).abs() < 1e-4);
        assert!(hit.point.y.abs() < 1e-4);
        assert!((hit.point.z - 1.6).abs() < 1e-4);
    }

    #[test]
    fn test_pick_ground_misses_outside_and_upward() {
        let scene = scene();
        assert!(pick_ground(&Ray::down_at(40.0, 0.0), &scene).is_none());
        let up = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(pick_ground(&up, &scene).is_none());
    }

    #[test]
    fn test_pick_objects_sorted_and_includes_fixtures() {
        let mut scene = scene();
        let id = scene.add_placed(ShapeKind::Box, Transform::at([0.0, 0.5, 0.0]), Material::placed());

        let hits = pick_objects(&Ray::down_at(0.1, 0.1), &scene);
        assert!(hits.len() >= 3, "box, grid and ground expected, got {hits:?}");
        assert_eq!(hits[0].node, id);
        assert!((hits[0].distance - (PROBE_HEIGHT - 1.0)).abs() < 1e-3);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(hits[1..].iter().all(|h| !scene.is_placed(h.node)));
    }

    #[test]
    fn test_pick_respects_transform() {
        let mut scene = scene();
        let t = Transform {
            position: [3.0, 0.5, 0.0],
            rotation: [0.0, 0.7, 0.0],
            scale: [2.0, 1.0, 1.0],
        };
        let id = scene.add_placed(ShapeKind::Box, t, Material::placed());

        assert_eq!(pick_placed(&Ray::down_at(3.0, 0.0), &scene).map(|h| h.node), Some(id));
        assert!(pick_placed(&Ray::down_at(0.0, 0.0), &scene).is_none());
    }

    #[test]
    fn test_pick_torus_knot_hole_misses() {
        let mut scene = scene();
        // Knot lies in its local XY plane; a ray along Z through the centre passes the hole
        scene.add_placed(ShapeKind::TorusKnot, Transform::at([0.0, 1.0, 0.0]), Material::placed());
        let through_hole = Ray::new(Vec3::new(0.0, 1.0, 5.0), Vec3::NEG_Z);
        assert!(pick_placed(&through_hole, &scene).is_none());
        let on_ring = Ray::new(Vec3::new(0.6, 1.0, 5.0), Vec3::NEG_Z);
        assert!(pick_placed(&on_ring, &scene).is_some());
    }

    #[test]
    fn test_zero_scale_is_not_pickable() {
        let mut scene = scene();
        let t = Transform {
            scale: [0.0, 1.0, 1.0],
            ..Transform::at([0.0, 0.5, 0.0])
        };
        scene.add_placed(ShapeKind::Sphere, t, Material::placed());
        assert!(pick_placed(&Ray::down_at(0.0, 0.0), &scene).is_none());
    }
}
