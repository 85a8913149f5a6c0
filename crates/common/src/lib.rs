//! Shared value types for the lumen renderers.
//!
//! Both the mesh rasterizer and the sphere ray tracer speak in terms of these
//! types. Nothing here touches the GPU.

mod types;

pub use types::{Material, PointLight, Ray, to_rgba8};

pub fn crate_info() -> &'static str {
    "lumen-common v0.1.0"
}
