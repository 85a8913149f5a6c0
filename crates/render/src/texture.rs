use crate::RenderError;
use glam::{Vec2, Vec4};
use std::path::Path;

/// RGBA8 texture, rows stored top to bottom as decoded from the image file.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    rgba8: Vec<u8>,
}

impl Texture {
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyImage { width, height });
        }
        if rgba8.len() != width as usize * height as usize * 4 {
            return Err(RenderError::PixelData {
                width,
                height,
                len: rgba8.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba8,
        })
    }

    /// Decode an image file into an RGBA8 texture.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let img = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = img.dimensions();
        tracing::debug!("loaded texture {} ({width}x{height})", path.as_ref().display());
        Self::from_rgba8(width, height, img.into_raw())
    }

    /// Single-colour texture.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba8: rgba.to_vec(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba8(&self) -> &[u8] {
        &self.rgba8
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        let i = (y * self.width as usize + x) * 4;
        let p = &self.rgba8[i..i + 4];
        Vec4::new(p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32) / 255.0
    }

    /// Bilinear sample with repeat addressing.
    ///
    /// `v = 0` is the bottom row of the image, as in OBJ texture coordinates.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let x = uv.x * self.width as f32 - 0.5;
        let y = (1.0 - uv.y) * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    /// Half-resolution copy, each texel the average of up to a 2x2 block.
    pub fn downsample(&self) -> Self {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut rgba8 = Vec::with_capacity(width as usize * height as usize * 4);

        for y in 0..height {
            for x in 0..width {
                let mut sum = [0u32; 4];
                let mut count = 0u32;
                for sy in (y * 2)..(y * 2 + 2).min(self.height) {
                    for sx in (x * 2)..(x * 2 + 2).min(self.width) {
                        let i = (sy as usize * self.width as usize + sx as usize) * 4;
                        for (c, s) in sum.iter_mut().enumerate() {
                            *s += self.rgba8[i + c] as u32;
                        }
                        count += 1;
                    }
                }
                rgba8.extend(sum.iter().map(|s| ((s + count / 2) / count) as u8));
            }
        }

        Self {
            width,
            height,
            rgba8,
        }
    }

    /// This texture followed by successively halved levels down to 1x1.
    pub fn mip_chain(&self) -> Vec<Texture> {
        let mut levels = vec![self.clone()];
        while let Some(last) = levels.last() {
            if last.width == 1 && last.height == 1 {
                break;
            }
            let next = last.downsample();
            levels.push(next);
        }
        levels
    }
}
