use glam::{Mat4, Vec2, Vec3, Vec4};

use super::picking::Ray;
use crate::render::NavigationControl;
use crate::state::settings::CameraSettings;

/// Orbit camera for the 3D viewport
pub struct ArcBallCamera {
    /// Horizontal rotation angle (radians)
    pub yaw: f32,
    /// Vertical rotation angle (radians)
    pub pitch: f32,
    /// Distance from target
    pub distance: f32,
    /// Camera target point
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Orbit/pan/zoom input accepted
    enabled: bool,
}

impl Default for ArcBallCamera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

impl ArcBallCamera {
    /// Camera placed at `settings.position`, looking at `settings.target`.
    pub fn from_settings(settings: &CameraSettings) -> Self {
        let target = Vec3::from(settings.target);
        let offset = Vec3::from(settings.position) - target;
        let distance = offset.length().max(0.5);
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            target,
            fov: settings.fov_degrees.to_radians(),
            near: settings.near,
            far: settings.far,
            enabled: true,
        }
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx.to_radians();
        self.pitch = (self.pitch + dy.to_radians()).clamp(-1.5, 1.5);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance * (1.0 - delta)).clamp(0.5, 200.0);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        let right = self.right_vector();
        let up = self.up_vector();
        self.target += right * dx + up * dy;
    }

    /// Camera position in world space
    pub fn eye_position(&self) -> Vec3 {
        let cy = self.yaw.cos();
        let sy = self.yaw.sin();
        let cp = self.pitch.cos();
        let sp = self.pitch.sin();

        self.target
            + Vec3::new(
                self.distance * cp * sy,
                self.distance * sp,
                self.distance * cp * cy,
            )
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    /// Projection matrix (camera -> clip)
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    fn right_vector(&self) -> Vec3 {
        let fwd = (self.target - self.eye_position()).normalize_or_zero();
        fwd.cross(Vec3::Y).normalize_or_zero()
    }

    fn up_vector(&self) -> Vec3 {
        let fwd = (self.target - self.eye_position()).normalize_or_zero();
        let right = self.right_vector();
        right.cross(fwd).normalize_or_zero()
    }

    /// Project a world point to viewport pixels (origin top-left) plus its
    /// view depth. None when the point is behind the camera.
    pub fn project(&self, point: Vec3, size: Vec2) -> Option<(Vec2, f32)> {
        let vp = self.view_projection(size.x / size.y);
        let p = vp * point.extend(1.0);
        if p.w <= self.near {
            return None;
        }
        let ndc = p.truncate() / p.w;
        let x = (ndc.x + 1.0) * 0.5 * size.x;
        let y = (1.0 - ndc.y) * 0.5 * size.y;
        Some((Vec2::new(x, y), p.w))
    }

    /// Cast a ray from a viewport pixel (origin top-left) into the scene
    pub fn screen_ray(&self, pos: Vec2, size: Vec2) -> Ray {
        let aspect = size.x / size.y;

        // Screen → NDC
        let ndc_x = pos.x / size.x * 2.0 - 1.0;
        let ndc_y = 1.0 - pos.y / size.y * 2.0;

        let vp_inv = self.view_projection(aspect).inverse();

        let near_world = vp_inv * Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
        let far_world = vp_inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near = near_world.truncate() / near_world.w;
        let far = far_world.truncate() / far_world.w;

        Ray::new(self.eye_position(), far - near)
    }
}

impl NavigationControl for ArcBallCamera {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
