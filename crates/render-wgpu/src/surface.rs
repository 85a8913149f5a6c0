//! Presentation choices shared by the viewer and both passes.
//!
//! Shader output goes to the screen as stored, the same bytes the CPU
//! framebuffer writes. Nothing is sRGB-decoded on sampling or sRGB-encoded
//! on presentation.

/// Format for mesh textures and environment cube faces.
pub const TEXEL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Surface configuration format plus the format the passes render through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFormats {
    pub surface: wgpu::TextureFormat,
    pub view: wgpu::TextureFormat,
}

impl SurfaceFormats {
    /// Prefer a non-sRGB surface format. When the surface offers only sRGB
    /// formats, render through the linear variant as a view format.
    pub fn choose(offered: &[wgpu::TextureFormat]) -> Option<Self> {
        if let Some(&linear) = offered.iter().find(|f| !f.is_srgb()) {
            return Some(Self {
                surface: linear,
                view: linear,
            });
        }
        offered.first().map(|&surface| Self {
            surface,
            view: surface.remove_srgb_suffix(),
        })
    }

    /// Extra view formats for `SurfaceConfiguration::view_formats`.
    pub fn extra_view_formats(&self) -> Vec<wgpu::TextureFormat> {
        if self.view == self.surface {
            Vec::new()
        } else {
            vec![self.view]
        }
    }
}

/// Opaque when the compositor supports it, so missed rays (alpha 0) do not
/// turn the window transparent.
pub fn choose_alpha_mode(offered: &[wgpu::CompositeAlphaMode]) -> wgpu::CompositeAlphaMode {
    if offered.contains(&wgpu::CompositeAlphaMode::Opaque) {
        wgpu::CompositeAlphaMode::Opaque
    } else {
        offered
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto)
    }
}
