use crate::camera::Camera;
use crate::environment::Environment;
use crate::sphere::Sphere;
use crate::SceneError;
use glam::Vec3;
use lumen_common::{Material, PointLight};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_bounce_limit() -> u32 {
    5
}

/// Sphere scene description, loadable from YAML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    #[serde(default)]
    pub lights: Vec<PointLight>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_bounce_limit")]
    pub bounce_limit: u32,
    #[serde(default)]
    pub camera: Camera,
}

impl Scene {
    /// Load a scene; the format follows the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let scene: Scene = match extension(path).as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => return Err(SceneError::UnknownFormat(path.to_path_buf())),
        };
        scene.validate()?;
        tracing::info!(
            "loaded scene {}: {} spheres, {} lights, bounce limit {}",
            path.display(),
            scene.spheres.len(),
            scene.lights.len(),
            scene.bounce_limit
        );
        Ok(scene)
    }

    /// Save a scene; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let path = path.as_ref();
        let text = match extension(path).as_deref() {
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            Some("json") => serde_json::to_string_pretty(self)?,
            _ => return Err(SceneError::UnknownFormat(path.to_path_buf())),
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Reject geometry and materials the tracer cannot handle.
    pub fn validate(&self) -> Result<(), SceneError> {
        for (i, s) in self.spheres.iter().enumerate() {
            if !(s.radius.is_finite() && s.radius > 0.0) {
                return Err(SceneError::Invalid(format!(
                    "sphere {i} has radius {}",
                    s.radius
                )));
            }
            if !s.center.is_finite() {
                return Err(SceneError::Invalid(format!("sphere {i} has a non-finite center")));
            }
            if s.mtl.n < 0.0 {
                return Err(SceneError::Invalid(format!(
                    "sphere {i} has negative specular exponent {}",
                    s.mtl.n
                )));
            }
        }
        if self.lights.is_empty() {
            tracing::warn!("scene has no lights; only reflections of the environment will show");
        }
        Ok(())
    }

    /// Ground sphere, three coloured spheres and two lights.
    pub fn default_scene() -> Self {
        let shiny = |k_d: Vec3| Material {
            k_d,
            k_s: Vec3::splat(0.2),
            n: 100.0,
        };
        Scene {
            spheres: vec![
                Sphere {
                    center: Vec3::new(0.0, 0.0, -10001.0),
                    radius: 10000.0,
                    mtl: Material {
                        k_d: Vec3::new(0.1, 0.1, 0.2),
                        k_s: Vec3::splat(0.2),
                        n: 10.0,
                    },
                },
                Sphere {
                    center: Vec3::ZERO,
                    radius: 1.0,
                    mtl: shiny(Vec3::new(0.5, 0.0, 0.0)),
                },
                Sphere {
                    center: Vec3::new(-2.0, 2.0, -0.5),
                    radius: 0.5,
                    mtl: shiny(Vec3::new(0.0, 0.5, 0.0)),
                },
                Sphere {
                    center: Vec3::new(2.0, 1.5, -0.25),
                    radius: 0.75,
                    mtl: Material {
                        k_d: Vec3::new(0.0, 0.0, 0.2),
                        k_s: Vec3::splat(0.8),
                        n: 1000.0,
                    },
                },
            ],
            lights: vec![
                PointLight {
                    position: Vec3::new(0.0, -10.0, 10.0),
                    intensity: Vec3::ONE,
                },
                PointLight {
                    position: Vec3::new(-10.0, 5.0, 6.0),
                    intensity: Vec3::splat(0.4),
                },
            ],
            environment: Environment::default(),
            bounce_limit: default_bounce_limit(),
            camera: Camera::default(),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
