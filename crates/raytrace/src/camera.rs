use glam::Vec3;
use lumen_common::Ray;
use serde::{Deserialize, Serialize};

/// Pinhole camera. Scenes are Z-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -8.0, 2.0),
            target: Vec3::ZERO,
            up: Vec3::Z,
            fov_deg: 45.0,
        }
    }
}

impl Camera {
    /// Orthonormal (forward, right, up) frame.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.position).normalize_or(Vec3::Y);
        let right = forward.cross(self.up).normalize_or(Vec3::X);
        let up = right.cross(forward);
        (forward, right, up)
    }

    /// Primary ray through the centre of pixel (`px`, `py`), row 0 at the top.
    pub fn primary_ray(&self, px: u32, py: u32, width: u32, height: u32) -> Ray {
        let (forward, right, up) = self.basis();
        let aspect = width as f32 / height.max(1) as f32;
        let half = (self.fov_deg.to_radians() * 0.5).tan();
        let sx = (2.0 * (px as f32 + 0.5) / width as f32 - 1.0) * aspect * half;
        let sy = (1.0 - 2.0 * (py as f32 + 0.5) / height as f32) * half;
        Ray::new(self.position, (forward + right * sx + up * sy).normalize())
    }

    /// Rotate the eye around the target: azimuth about the up axis, then
    /// elevation toward it. Elevation stays short of the poles.
    pub fn orbit(&mut self, d_azimuth: f32, d_elevation: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= 0.0 {
            return;
        }
        let up = self.up.normalize_or(Vec3::Z);
        let height = offset.dot(up);
        let planar = offset - up * height;
        let elevation = (height / radius).clamp(-1.0, 1.0).asin();
        let new_elevation = (elevation + d_elevation).clamp(-1.5, 1.5);

        let planar_dir = planar.normalize_or(up.any_orthonormal_vector());
        let planar_dir = glam::Quat::from_axis_angle(up, d_azimuth) * planar_dir;
        self.position = self.target
            + (planar_dir * new_elevation.cos() + up * new_elevation.sin()) * radius;
    }

    /// Scale the eye distance to the target.
    pub fn dolly(&mut self, factor: f32) {
        let offset = (self.position - self.target) * factor;
        if offset.length() > 1e-3 {
            self.position = self.target + offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_ray_looks_at_target() {
        let cam = Camera::default();
        // Odd size so a pixel centre lies exactly on the optical axis.
        let ray = cam.primary_ray(50, 50, 101, 101);
        let to_target = (cam.target - cam.position).normalize();
        assert!((ray.dir - to_target).length() < 1e-5);
    }

    #[test]
    fn top_rows_look_up() {
        let cam = Camera::default();
        let top = cam.primary_ray(50, 0, 101, 101);
        let bottom = cam.primary_ray(50, 100, 101, 101);
        assert!(top.dir.z > bottom.dir.z);
    }

    #[test]
    fn orbit_keeps_distance() {
        let mut cam = Camera::default();
        let before = cam.position.distance(cam.target);
        cam.orbit(0.7, 0.3);
        assert!((cam.position.distance(cam.target) - before).abs() < 1e-4);
        cam.orbit(0.0, 10.0);
        let (forward, _, _) = cam.basis();
        assert!(forward.z > -1.0);
    }

    #[test]
    fn dolly_scales_distance() {
        let mut cam = Camera::default();
        let before = cam.position.distance(cam.target);
        cam.dolly(0.5);
        assert!((cam.position.distance(cam.target) - before * 0.5).abs() < 1e-4);
    }
}
