use crate::framebuffer::Framebuffer;
use crate::renderer::{FrameParams, Renderer};
use crate::shading::shade_fragment;
use crate::texture::Texture;
use crate::transform::swap_yz_matrix;
use crate::RenderError;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use lumen_mesh::MeshBuffers;

/// Post-vertex-stage attributes.
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vec4,
    view: Vec3,
    normal: Vec3,
    uv: Vec2,
}

impl ClipVertex {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            clip: self.clip.lerp(other.clip, t),
            view: self.view.lerp(other.view, t),
            normal: self.normal.lerp(other.normal, t),
            uv: self.uv.lerp(other.uv, t),
        }
    }

    /// Signed distance to the near plane (z = -w); inside when >= 0.
    fn near_distance(&self) -> f32 {
        self.clip.z + self.clip.w
    }
}

/// Window-space vertex with attributes pre-divided by w.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
    inv_w: f32,
    view: Vec3,
    normal: Vec3,
    uv: Vec2,
}

/// CPU port of the mesh shader pair: z-buffered, perspective-correct, no culling.
#[derive(Debug, Default)]
pub struct SoftwareRasterizer {
    texture: Option<Texture>,
}

impl SoftwareRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_texture(&mut self, texture: Texture) {
        self.texture = Some(texture);
    }

    pub fn clear_texture(&mut self) {
        self.texture = None;
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    fn vertex_stage(
        mesh: &MeshBuffers,
        i: usize,
        mvp_swap: Mat4,
        mv_swap: Mat4,
        nt: Mat3,
        light: Vec3,
    ) -> ClipVertex {
        let pos = mesh.position(i).extend(1.0);
        ClipVertex {
            clip: mvp_swap * pos,
            view: light - (mv_swap * pos).truncate(),
            normal: nt * mesh.normal(i),
            uv: mesh.tex_coord(i),
        }
    }

    fn to_screen(v: &ClipVertex, width: f32, height: f32) -> ScreenVertex {
        let inv_w = 1.0 / v.clip.w;
        let ndc = v.clip.truncate() * inv_w;
        ScreenVertex {
            x: (ndc.x * 0.5 + 0.5) * width,
            y: (0.5 - ndc.y * 0.5) * height,
            z: ndc.z * 0.5 + 0.5,
            inv_w,
            view: v.view * inv_w,
            normal: v.normal * inv_w,
            uv: v.uv * inv_w,
        }
    }

    fn rasterize(&self, fb: &mut Framebuffer, tri: [ClipVertex; 3], frame: &FrameParams) {
        let (w, h) = (fb.width() as f32, fb.height() as f32);
        let [a, b, c] = tri.map(|v| Self::to_screen(&v, w, h));

        let area = edge(&a, &b, c.x, c.y);
        if area.abs() < f32::EPSILON {
            return;
        }

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(w - 1.0);
        let max_y = a.y.max(b.y).max(c.y).ceil().min(h - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let (max_x, max_y) = (max_x as u32, max_y as u32);

        let texture = if frame.state.show_texture {
            self.texture.as_ref()
        } else {
            None
        };

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let (sx, sy) = (px as f32 + 0.5, py as f32 + 0.5);
                let w0 = edge(&b, &c, sx, sy) / area;
                let w1 = edge(&c, &a, sx, sy) / area;
                let w2 = edge(&a, &b, sx, sy) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * a.z + w1 * b.z + w2 * c.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }

                let inv_w = w0 * a.inv_w + w1 * b.inv_w + w2 * c.inv_w;
                let view = (a.view * w0 + b.view * w1 + c.view * w2) / inv_w;
                let normal = (a.normal * w0 + b.normal * w1 + c.normal * w2) / inv_w;
                let uv = (a.uv * w0 + b.uv * w1 + c.uv * w2) / inv_w;

                let tex_color = texture.map(|t| t.sample(uv));
                let color = shade_fragment(&frame.state, normal, view, tex_color, z);
                fb.write_fragment(px, py, z, color);
            }
        }
    }
}

impl Renderer for SoftwareRasterizer {
    type Output = Result<Framebuffer, RenderError>;

    fn render(&self, mesh: &MeshBuffers, frame: &FrameParams) -> Self::Output {
        mesh.validate()?;

        let mut fb = Framebuffer::new(frame.width, frame.height);
        fb.clear(frame.clear_color);

        let swap = swap_yz_matrix(frame.state.swap_yz);
        let mvp_swap = frame.matrices.mvp * swap;
        let mv_swap = frame.matrices.mv * swap;
        let nt = frame.matrices.normal;
        let light = frame.state.light_dir;

        let mut drawn = 0usize;
        for t in 0..mesh.triangle_count() {
            let tri = [0, 1, 2]
                .map(|k| Self::vertex_stage(mesh, t * 3 + k, mvp_swap, mv_swap, nt, light));
            let poly = clip_near(tri);
            if poly.len() < 3 {
                continue;
            }
            for k in 1..poly.len() - 1 {
                self.rasterize(&mut fb, [poly[0], poly[k], poly[k + 1]], frame);
            }
            drawn += 1;
        }

        tracing::debug!(
            "rasterized {drawn}/{} triangles at {}x{}",
            mesh.triangle_count(),
            frame.width,
            frame.height
        );
        Ok(fb)
    }
}

fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Sutherland-Hodgman clip of a triangle against the near plane.
fn clip_near(tri: [ClipVertex; 3]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let cur = tri[i];
        let next = tri[(i + 1) % 3];
        let d_cur = cur.near_distance();
        let d_next = next.near_distance();

        if d_cur >= 0.0 {
            out.push(cur);
        }
        if (d_cur >= 0.0) != (d_next >= 0.0) {
            let t = d_cur / (d_cur - d_next);
            out.push(cur.lerp(&next, t));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::MeshDrawState;
    use crate::view::OrbitView;

    /// One large triangle in the z=0 plane covering the unit square.
    fn big_triangle(z: f32, normal_z: f32) -> MeshBuffers {
        MeshBuffers {
            vert_pos: vec![-1.0, -1.0, z, 3.0, -1.0, z, -1.0, 3.0, z],
            tex_coords: vec![0.0; 6],
            normals: [0.0, 0.0, normal_z].repeat(3),
        }
    }

    fn frame(state: MeshDrawState) -> FrameParams {
        FrameParams {
            width: 32,
            height: 32,
            matrices: OrbitView::default().matrices(1.0),
            state,
            clear_color: Vec4::ZERO,
        }
    }

    fn lit_state(show_texture: bool) -> MeshDrawState {
        MeshDrawState {
            show_texture,
            light_dir: Vec3::new(0.0, 0.6, -0.8),
            shininess: 1000.0,
            swap_yz: false,
        }
    }

    #[test]
    fn covers_centre_not_corner() {
        let r = SoftwareRasterizer::new();
        let fb = r.render(&big_triangle(0.0, -1.0), &frame(lit_state(false))).unwrap();
        assert_eq!(fb.pixel(16, 16).w, 1.0);
        assert_eq!(fb.pixel(0, 0), Vec4::ZERO);
    }

    #[test]
    fn textured_fragment_is_diffuse_times_texel() {
        let mut r = SoftwareRasterizer::new();
        r.set_texture(Texture::solid([0, 0, 255, 255]));
        let fb = r.render(&big_triangle(0.0, -1.0), &frame(lit_state(true))).unwrap();
        let c = fb.pixel(16, 16);
        assert!(c.x < 0.01);
        assert!((c.z - 0.8).abs() < 0.01);
    }

    #[test]
    fn depth_colour_uses_window_depth() {
        let r = SoftwareRasterizer::new();
        let fb = r.render(&big_triangle(0.0, -1.0), &frame(lit_state(false))).unwrap();
        let c = fb.pixel(16, 16);
        let z = fb.depth(16, 16);
        assert!(z > 0.0 && z < 1.0);
        assert!((c.x - 0.8).abs() < 0.01);
        assert!((c.y - 0.8 * z * z).abs() < 0.01);
    }

    #[test]
    fn nearer_triangle_wins() {
        // The camera looks down +Z, so smaller object z is nearer.
        let mut mesh = big_triangle(0.5, -1.0);
        let near = big_triangle(-0.5, -1.0);
        mesh.vert_pos.extend_from_slice(&near.vert_pos);
        mesh.tex_coords.extend_from_slice(&near.tex_coords);
        mesh.normals.extend_from_slice(&near.normals);

        let r = SoftwareRasterizer::new();
        let both = r.render(&mesh, &frame(lit_state(false))).unwrap();
        let far_only = r.render(&big_triangle(0.5, -1.0), &frame(lit_state(false))).unwrap();
        let near_only = r.render(&near, &frame(lit_state(false))).unwrap();
        assert!(both.depth(16, 16) < far_only.depth(16, 16));
        assert_eq!(both.depth(16, 16), near_only.depth(16, 16));
    }

    #[test]
    fn swapped_axes_move_geometry() {
        // A triangle lying in the y=0 plane is edge-on until Y and Z swap.
        let mesh = MeshBuffers {
            vert_pos: vec![-1.0, 0.0, -1.0, 3.0, 0.0, -1.0, -1.0, 0.0, 3.0],
            tex_coords: vec![0.0; 6],
            normals: [0.0, -1.0, 0.0].repeat(3),
        };
        let r = SoftwareRasterizer::new();
        let flat = r.render(&mesh, &frame(lit_state(false))).unwrap();
        assert_eq!(flat.pixel(16, 8), Vec4::ZERO);

        let swapped = MeshDrawState {
            swap_yz: true,
            ..lit_state(false)
        };
        let fb = r.render(&mesh, &frame(swapped)).unwrap();
        assert_eq!(fb.pixel(16, 8).w, 1.0);
    }

    #[test]
    fn geometry_behind_camera_is_clipped() {
        let r = SoftwareRasterizer::new();
        let fb = r.render(&big_triangle(-10.0, -1.0), &frame(lit_state(false))).unwrap();
        assert!(fb.to_rgba8().iter().all(|&b| b == 0));
    }

    #[test]
    fn clip_near_splits_crossing_triangle() {
        let v = |z: f32, w: f32| ClipVertex {
            clip: Vec4::new(0.0, 0.0, z, w),
            view: Vec3::ZERO,
            normal: Vec3::Z,
            uv: Vec2::ZERO,
        };
        let poly = clip_near([v(0.0, 1.0), v(-2.0, 1.0), v(0.5, 1.0)]);
        assert_eq!(poly.len(), 4);
        assert!(poly.iter().all(|p| p.near_distance() >= -1e-6));
    }

    #[test]
    fn invalid_buffers_are_rejected() {
        let mut mesh = big_triangle(0.0, -1.0);
        mesh.normals.pop();
        let r = SoftwareRasterizer::new();
        assert!(matches!(
            r.render(&mesh, &frame(lit_state(false))),
            Err(RenderError::Mesh(_))
        ));
    }
}
