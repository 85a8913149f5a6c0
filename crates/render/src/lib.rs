//! Rendering interface for textured, lit triangle meshes.
//!
//! # Invariants
//! - Renderers never mutate the mesh they draw.
//! - Matrices follow the OpenGL clip convention (depth in -1..1); GPU
//!   backends convert at upload time.
//!
//! The software rasterizer is a CPU port of the mesh shader pair. It produces
//! the same image as the wgpu backend modulo filtering, which makes it the
//! reference for tests and for headless output.

mod framebuffer;
mod raster;
mod renderer;
mod shading;
mod texture;
mod transform;
mod view;

pub use framebuffer::Framebuffer;
pub use raster::SoftwareRasterizer;
pub use renderer::{FrameParams, Renderer};
pub use shading::{MeshDrawState, shade_fragment};
pub use texture::Texture;
pub use transform::{model_view, normal_matrix, projection, swap_yz_matrix};
pub use view::{OrbitView, ViewMatrices};

/// Errors from rendering and image IO.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("mesh error: {0}")]
    Mesh(#[from] lumen_mesh::MeshError),
    #[error("pixel data length {len} does not match {width}x{height} RGBA")]
    PixelData { width: u32, height: u32, len: usize },
    #[error("zero-sized image {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

pub fn crate_info() -> &'static str {
    "lumen-render v0.1.0"
}
