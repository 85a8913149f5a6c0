//! wgpu backend for the viewer.
//!
//! Two passes share the surface: [`MeshDrawer`] draws a textured, lit
//! triangle mesh with a depth buffer, and [`RayTracePass`] runs the sphere
//! ray tracer per pixel in a full-screen fragment shader.
//!
//! # Invariants
//! - Matrices arrive in GL clip space and are remapped with [`OPENGL_TO_WGPU`].
//! - The GPU tracer uses the same bias and bounce cap as the CPU tracer.
//! - Colours are written without gamma correction, like the CPU framebuffer.

mod mesh_drawer;
mod ray_pass;
mod shaders;
mod surface;

pub use mesh_drawer::MeshDrawer;
pub use ray_pass::RayTracePass;
pub use surface::{SurfaceFormats, TEXEL_FORMAT, choose_alpha_mode};

use glam::{Mat4, Vec4};
use lumen_mesh::MeshError;

/// Errors from the GPU backend.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("mesh rejected: {0}")]
    Mesh(#[from] MeshError),
}

/// Maps GL clip depth (-w..w) onto wgpu's 0..w.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub(crate) fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
