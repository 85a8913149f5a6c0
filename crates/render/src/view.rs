use crate::transform::{model_view, normal_matrix, projection};
use glam::{Mat3, Mat4};

/// Matrices consumed by the mesh draw path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewMatrices {
    pub mvp: Mat4,
    pub mv: Mat4,
    pub normal: Mat3,
}

/// Object-orbit view: the mesh is rotated in front of a fixed camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitView {
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub translation_z: f32,
    pub fov_deg: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitView {
    fn default() -> Self {
        Self {
            rotation_x: 0.0,
            rotation_y: 0.0,
            translation_z: 3.0,
            fov_deg: 60.0,
            min_distance: 1.0,
            max_distance: 20.0,
        }
    }
}

impl OrbitView {
    /// Rotate by a pointer drag. A drag across the full viewport turns
    /// the object by five radians.
    pub fn drag(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        self.rotation_y -= dx / width.max(1.0) * 5.0;
        self.rotation_x -= dy / height.max(1.0) * 5.0;
    }

    /// Scale the viewing distance by a wheel delta.
    pub fn zoom(&mut self, delta: f32) {
        self.translation_z *= 1.0 + delta / 1000.0;
        self.translation_z = self
            .translation_z
            .clamp(self.min_distance, self.max_distance);
    }

    pub fn matrices(&self, aspect: f32) -> ViewMatrices {
        let mv = model_view(
            0.0,
            0.0,
            self.translation_z,
            self.rotation_x,
            self.rotation_y,
        );
        let proj = projection(aspect, self.translation_z, self.fov_deg);
        ViewMatrices {
            mvp: proj * mv,
            mv,
            normal: normal_matrix(mv),
        }
    }
}
