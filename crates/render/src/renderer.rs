use crate::shading::MeshDrawState;
use crate::view::ViewMatrices;
use glam::Vec4;
use lumen_mesh::MeshBuffers;

/// Per-frame inputs of the mesh draw path.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub width: u32,
    pub height: u32,
    pub matrices: ViewMatrices,
    pub state: MeshDrawState,
    pub clear_color: Vec4,
}

/// Draws a triangle-soup mesh into some target, such as a CPU framebuffer.
///
/// Implementations take the mesh by shared reference and leave it untouched.
pub trait Renderer {
    type Output;

    /// Render one frame of the given mesh.
    fn render(&self, mesh: &MeshBuffers, frame: &FrameParams) -> Self::Output;
}
