use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Surface response for Blinn-Phong shading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Diffuse coefficient.
    pub k_d: Vec3,
    /// Specular coefficient. Also the reflection tint for mirror bounces.
    #[serde(default)]
    pub k_s: Vec3,
    /// Specular exponent.
    #[serde(default = "default_exponent")]
    pub n: f32,
}

fn default_exponent() -> f32 {
    20.0
}

impl Default for Material {
    fn default() -> Self {
        Self {
            k_d: Vec3::splat(0.5),
            k_s: Vec3::ZERO,
            n: default_exponent(),
        }
    }
}

impl Material {
    /// A material reflects when its specular coefficients sum above zero.
    pub fn is_reflective(&self) -> bool {
        self.k_s.x + self.k_s.y + self.k_s.z > 0.0
    }
}

/// Point light with an RGB intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: Vec3,
}

/// Ray with origin `pos` and (not necessarily unit) direction `dir`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub pos: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(pos: Vec3, dir: Vec3) -> Self {
        Self { pos, dir }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.pos + self.dir * t
    }
}

/// Convert a linear RGBA colour to 8-bit channels, clamping to [0, 1].
pub fn to_rgba8(color: Vec4) -> [u8; 4] {
    let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    [
        c.x.round() as u8,
        c.y.round() as u8,
        c.z.round() as u8,
        c.w.round() as u8,
    ]
}
