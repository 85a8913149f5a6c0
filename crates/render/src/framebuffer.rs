use crate::RenderError;
use glam::Vec4;
use lumen_common::to_rgba8;
use std::path::Path;

/// Linear RGBA colour target with an attached depth buffer.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Vec4::ZERO; len],
            depth: vec![1.0; len],
        }
    }

    /// Build from row-major colours (top row first); depth is cleared.
    pub fn from_pixels(width: u32, height: u32, color: Vec<Vec4>) -> Self {
        debug_assert_eq!(color.len(), width as usize * height as usize);
        let depth = vec![1.0; color.len()];
        Self {
            width,
            height,
            color,
            depth,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Vec4) {
        self.color.fill(color);
        self.depth.fill(1.0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.color[self.index(x, y)]
    }

    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    /// Write a fragment if it passes the LESS depth test.
    pub fn write_fragment(&mut self, x: u32, y: u32, depth: f32, color: Vec4) -> bool {
        let i = self.index(x, y);
        if depth < self.depth[i] {
            self.depth[i] = depth;
            self.color[i] = color;
            true
        } else {
            false
        }
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color.iter().flat_map(|c| to_rgba8(*c)).collect()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8()).ok_or(
            RenderError::PixelData {
                width: self.width,
                height: self.height,
                len: self.color.len() * 4,
            },
        )?;
        img.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
        tracing::info!(
            "wrote {}x{} image to {}",
            self.width,
            self.height,
            path.as_ref().display()
        );
        Ok(())
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
