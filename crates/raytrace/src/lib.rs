//! Sphere ray tracer.
//!
//! Primary rays come from a pinhole camera. Each hit is shaded with
//! Blinn-Phong against every point light, with one shadow ray per light,
//! then mirror reflections are followed while the surface has a non-zero
//! specular coefficient, up to the scene's bounce limit.
//!
//! # Invariants
//! - Intersections closer than [`BIAS`] are ignored, so shadow and
//!   reflection rays never re-hit the surface they leave.
//! - At most `min(bounce_limit, MAX_BOUNCES)` reflection rays per pixel.
//! - Rays that start inside a sphere do not hit that sphere.

mod camera;
mod environment;
mod scene;
mod sphere;
mod tracer;

pub use camera::Camera;
pub use environment::{CubeFaces, CubeMap, Environment, EnvironmentMap};
pub use scene::Scene;
pub use sphere::{BIAS, HitInfo, Sphere, intersect_ray};
pub use tracer::{MAX_BOUNCES, RayTracer, RenderOptions};

use std::path::PathBuf;

/// Errors from scene loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown scene format for {0} (expected .yaml, .yml or .json)")]
    UnknownFormat(PathBuf),
    #[error("invalid scene: {0}")]
    Invalid(String),
    #[error("environment map: {0}")]
    Environment(#[from] lumen_render::RenderError),
}

pub fn crate_info() -> &'static str {
    "lumen-raytrace v0.1.0"
}
