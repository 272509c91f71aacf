//! Fixed scene content: ground, grid and lights.

use std::f32::consts::FRAC_PI_2;

use shared::{Material, Transform};

use super::{NodeKind, SceneGraph};
use crate::state::settings::GridSettings;

const GROUND_COLOR: u32 = 0xffffff;
const SUN_HEIGHT: f32 = 10.0;
const SUN_INTENSITY: f32 = 1.0;
const AMBIENT_INTENSITY: f32 = 0.5;

pub(super) fn install(scene: &mut SceneGraph, grid: &GridSettings) {
    scene.add(
        NodeKind::DirectionalLight { intensity: SUN_INTENSITY },
        Transform::at([0.0, SUN_HEIGHT, 0.0]),
        Material::placed(),
    );
    scene.add(
        NodeKind::AmbientLight { intensity: AMBIENT_INTENSITY },
        Transform::new(),
        Material::placed(),
    );
    scene.add(
        NodeKind::Grid {
            size: grid.size,
            divisions: grid.divisions,
        },
        Transform::new(),
        Material::placed(),
    );

    // Plane geometry lies in XY; rotate it flat onto XZ
    let ground = Transform {
        rotation: [-FRAC_PI_2, 0.0, 0.0],
        ..Transform::new()
    };
    scene.add(
        NodeKind::Ground { size: grid.size },
        ground,
        Material {
            color: GROUND_COLOR,
            ..Material::placed()
        },
    );
}
