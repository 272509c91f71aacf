//! Software painter for the viewport
//!
//! Projects scene triangles with the camera and fills them through an
//! `egui::Mesh`: ground first, then shapes far to near. Shading is flat Lambert against the fixture
//! lights: a directional light straight down and an ambient term.

use egui::epaint::{Mesh, Vertex, WHITE_UV};
use egui::{Color32, Pos2, Rect, Stroke, Ui};
use glam::{Mat3, Mat4, Vec2, Vec3};
use shared::Material;

use super::camera::ArcBallCamera;
use super::mesh::shape_mesh;
use super::picking::{model_matrix, Aabb};
use crate::state::scene::{NodeKind, SceneNode};
use crate::state::settings::AppSettings;
use crate::state::{Editor, NodeId};

/// Direction towards the directional light at (0, 10, 0)
const LIGHT_DIR: Vec3 = Vec3::Y;
/// Ground quads per side
const GROUND_TILES: u32 = 15;

/// Bounding box edges as corner index pairs, see `Aabb::corners`
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0),
    (4, 5), (5, 6), (6, 7), (7, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

struct Lights {
    directional: f32,
    ambient: f32,
}

struct Tri {
    points: [Pos2; 3],
    depth: f32,
    color: Color32,
}

/// Paint the whole viewport.
pub fn paint_viewport(ui: &Ui, rect: Rect, editor: &Editor<ArcBallCamera>) {
    let painter = ui.painter_at(rect);
    let settings = &editor.settings;
    let camera = &editor.navigation;

    let [r, g, b] = settings.viewport.background_color;
    painter.rect_filled(rect, 0.0, Color32::from_rgb(r, g, b));

    let lights = collect_lights(editor);
    let mut ground = Vec::new();
    let mut grid = None;
    let mut tris = Vec::new();
    let mut wireframes = Vec::new();

    for (_, node) in editor.scene.iter() {
        match node.kind {
            NodeKind::Ground { size } => {
                ground_triangles(&mut ground, camera, rect, size, &node.material, &lights);
            }
            NodeKind::Grid { size, divisions } if settings.grid.visible => {
                grid = Some((size, divisions));
            }
            NodeKind::Ghost(_) | NodeKind::Placed(_) if node.material.wireframe => {
                wireframes.push(node);
            }
            NodeKind::Ghost(_) | NodeKind::Placed(_) => {
                shape_triangles(&mut tris, camera, rect, node, &lights);
            }
            _ => {}
        }
    }

    // Layers: ground, grid lines, then shapes far to near
    painter.add(egui::Shape::mesh(build_mesh(&ground)));
    if let Some((size, divisions)) = grid {
        draw_grid(&painter, camera, rect, size, divisions);
    }
    tris.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    painter.add(egui::Shape::mesh(build_mesh(&tris)));

    for node in wireframes {
        draw_wireframe(&painter, camera, rect, node, &lights);
    }

    if let Some(id) = editor.selected() {
        if let Some(node) = editor.scene.get(id) {
            draw_selection_box(&painter, camera, rect, node, settings);
        }
    }

    if editor.interaction.is_placing() {
        draw_hint(&painter, rect, editor, editor.interaction.ghost());
    }
}

fn build_mesh(tris: &[Tri]) -> Mesh {
    let mut mesh = Mesh::default();
    for tri in tris {
        let base = mesh.vertices.len() as u32;
        for pos in tri.points {
            mesh.vertices.push(Vertex { pos, uv: WHITE_UV, color: tri.color });
        }
        mesh.add_triangle(base, base + 1, base + 2);
    }
    mesh
}

fn collect_lights(editor: &Editor<ArcBallCamera>) -> Lights {
    let mut lights = Lights { directional: 0.0, ambient: 0.0 };
    for (_, node) in editor.scene.iter() {
        match node.kind {
            NodeKind::DirectionalLight { intensity } => lights.directional += intensity,
            NodeKind::AmbientLight { intensity } => lights.ambient += intensity,
            _ => {}
        }
    }
    lights
}

fn to_screen(camera: &ArcBallCamera, rect: Rect, point: Vec3) -> Option<(Pos2, f32)> {
    let size = Vec2::new(rect.width(), rect.height());
    camera
        .project(point, size)
        .map(|(p, depth)| (rect.min + egui::vec2(p.x, p.y), depth))
}

fn shade(material: &Material, tint: Option<[u8; 3]>, normal: Vec3, lights: &Lights) -> Color32 {
    let light = (lights.ambient + lights.directional * normal.dot(LIGHT_DIR).max(0.0)).min(1.0);
    let base = material.rgb();
    let tint = tint.unwrap_or([255, 255, 255]);
    let channel = |i: usize| (f32::from(base[i]) * f32::from(tint[i]) / 255.0 * light) as u8;
    let alpha = if material.transparent { material.opacity } else { 1.0 };
    Color32::from_rgba_unmultiplied(channel(0), channel(1), channel(2), (alpha * 255.0) as u8)
}

fn ground_triangles(out: &mut Vec<Tri>, camera: &ArcBallCamera, rect: Rect, size: f32, material: &Material, lights: &Lights) {
    // Looking from below: the plane is single-sided
    if camera.eye_position().y < 0.0 {
        return;
    }
    let color = shade(material, None, Vec3::Y, lights);
    let half = size * 0.5;
    let step = size / GROUND_TILES as f32;

    // Tiled so the part in front of the camera survives when far corners are behind it
    for i in 0..GROUND_TILES {
        for j in 0..GROUND_TILES {
            let x0 = -half + i as f32 * step;
            let z0 = -half + j as f32 * step;
            let corners = [
                Vec3::new(x0, 0.0, z0),
                Vec3::new(x0 + step, 0.0, z0),
                Vec3::new(x0 + step, 0.0, z0 + step),
                Vec3::new(x0, 0.0, z0 + step),
            ];
            let [Some(a), Some(b), Some(c), Some(d)] = corners.map(|p| to_screen(camera, rect, p)) else {
                continue;
            };
            for points in [[a.0, b.0, c.0], [a.0, c.0, d.0]] {
                out.push(Tri { points, depth: 0.0, color });
            }
        }
    }
}

fn shape_triangles(out: &mut Vec<Tri>, camera: &ArcBallCamera, rect: Rect, node: &SceneNode, lights: &Lights) {
    let Some(shape) = node.shape() else { return };
    let mesh = shape_mesh(shape);
    let model = model_matrix(&node.transform);
    let normal_matrix = Mat3::from_mat4(model).inverse().transpose();
    let eye = camera.eye_position();
    let tint = node.texture.as_ref().and_then(|t| t.average_color);

    for tri in 0..mesh.triangle_count() {
        let idx = &mesh.indices[tri * 3..tri * 3 + 3];
        let world = [0, 1, 2].map(|k| model.transform_point3(mesh.position(idx[k] as usize)));
        let normal = (normal_matrix
            * (mesh.normal(idx[0] as usize) + mesh.normal(idx[1] as usize) + mesh.normal(idx[2] as usize)))
        .normalize_or_zero();

        let centroid = (world[0] + world[1] + world[2]) / 3.0;
        if normal.dot(centroid - eye) >= 0.0 {
            continue;
        }

        let projected = world.map(|p| to_screen(camera, rect, p));
        let [Some(a), Some(b), Some(c)] = projected else { continue };
        out.push(Tri {
            points: [a.0, b.0, c.0],
            depth: (a.1 + b.1 + c.1) / 3.0,
            color: shade(&node.material, tint, normal, lights),
        });
    }
}

fn draw_wireframe(painter: &egui::Painter, camera: &ArcBallCamera, rect: Rect, node: &SceneNode, lights: &Lights) {
    let Some(shape) = node.shape() else { return };
    let mesh = shape_mesh(shape);
    let model = model_matrix(&node.transform);
    let tint = node.texture.as_ref().and_then(|t| t.average_color);
    let stroke = Stroke::new(1.0, shade(&node.material, tint, Vec3::Y, lights));
    draw_edges(painter, camera, rect, &model, mesh.edges().into_iter().map(|(a, b)| {
        (mesh.position(a as usize), mesh.position(b as usize))
    }), stroke);
}

fn draw_selection_box(painter: &egui::Painter, camera: &ArcBallCamera, rect: Rect, node: &SceneNode, settings: &AppSettings) {
    let Some(shape) = node.shape() else { return };
    let corners = Aabb::from_mesh(shape_mesh(shape)).corners();
    let model = model_matrix(&node.transform);
    let [r, g, b] = settings.viewport.selection_color;
    let stroke = Stroke::new(2.0, Color32::from_rgb(r, g, b));
    draw_edges(painter, camera, rect, &model, BOX_EDGES.iter().map(|&(a, b)| (corners[a], corners[b])), stroke);
}

fn draw_edges(
    painter: &egui::Painter,
    camera: &ArcBallCamera,
    rect: Rect,
    model: &Mat4,
    edges: impl Iterator<Item = (Vec3, Vec3)>,
    stroke: Stroke,
) {
    for (a, b) in edges {
        let a = to_screen(camera, rect, model.transform_point3(a));
        let b = to_screen(camera, rect, model.transform_point3(b));
        if let (Some(a), Some(b)) = (a, b) {
            painter.line_segment([a.0, b.0], stroke);
        }
    }
}

fn draw_grid(painter: &egui::Painter, camera: &ArcBallCamera, rect: Rect, size: f32, divisions: u32) {
    let stroke = Stroke::new(0.5, Color32::from_rgb(136, 136, 136));
    let center = Stroke::new(1.0, Color32::from_rgb(68, 68, 68));
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;
    let at = |i: u32| -half + i as f32 * step;

    for i in 0..=divisions {
        let f = at(i);
        let stroke = if f.abs() < step * 0.5 { center } else { stroke };
        // One segment per cell, so lines partly behind the camera still show
        for j in 0..divisions {
            for (a, b) in [
                (Vec3::new(f, 0.0, at(j)), Vec3::new(f, 0.0, at(j + 1))),
                (Vec3::new(at(j), 0.0, f), Vec3::new(at(j + 1), 0.0, f)),
            ] {
                if let (Some(a), Some(b)) = (to_screen(camera, rect, a), to_screen(camera, rect, b)) {
                    painter.line_segment([a.0, b.0], stroke);
                }
            }
        }
    }
}

fn draw_hint(painter: &egui::Painter, rect: Rect, editor: &Editor<ArcBallCamera>, ghost: Option<NodeId>) {
    let text = match ghost.and_then(|g| editor.scene.get(g)) {
        Some(node) => {
            let [x, _, z] = node.transform.position;
            format!("{} at ({x}, {z})", editor.interaction.shape().label())
        }
        None => format!("Move over the grid to place a {}", editor.interaction.shape().label()),
    };
    painter.text(
        rect.left_top() + egui::vec2(10.0, 10.0),
        egui::Align2::LEFT_TOP,
        text,
        egui::FontId::proportional(13.0),
        Color32::from_rgb(60, 60, 60),
    );
}
