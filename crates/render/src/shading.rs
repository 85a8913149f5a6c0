use glam::{Vec3, Vec4};

/// Uniform state of the mesh draw path, shared by all backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshDrawState {
    /// Exchange the Y and Z axes of incoming positions.
    pub swap_yz: bool,
    /// Sample the bound texture; otherwise colour by depth.
    pub show_texture: bool,
    /// Light direction in view space.
    pub light_dir: Vec3,
    /// Blinn-Phong exponent.
    pub shininess: f32,
}

impl Default for MeshDrawState {
    fn default() -> Self {
        Self {
            swap_yz: false,
            show_texture: true,
            light_dir: Vec3::ONE,
            shininess: 50.0,
        }
    }
}

/// Mesh fragment program.
///
/// `view` is the interpolated light-minus-position vector from the vertex
/// stage, `frag_depth` the window-space depth in 0..1. `tex_color` is the
/// texture sample, or `None` when no texture is shown.
pub fn shade_fragment(
    state: &MeshDrawState,
    normal: Vec3,
    view: Vec3,
    tex_color: Option<Vec4>,
    frag_depth: f32,
) -> Vec4 {
    let w = state.light_dir.normalize_or_zero();
    let n = normal.normalize_or_zero();
    let v = view.normalize_or_zero();

    let diffuse = n.dot(w).max(0.0);
    let h = (w + v).normalize_or_zero();
    let specular = n.dot(h).abs().powf(state.shininess);

    let base = match tex_color {
        Some(c) if state.show_texture => c,
        _ => Vec4::new(1.0, frag_depth * frag_depth, 0.0, 1.0),
    };
    let rgb = base.truncate() * diffuse + Vec3::splat(specular);
    rgb.extend(base.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_colour_without_texture() {
        let state = MeshDrawState {
            show_texture: false,
            light_dir: Vec3::Z,
            shininess: 1000.0,
            ..MeshDrawState::default()
        };
        // Light and normal aligned, view perpendicular: no visible highlight.
        let c = shade_fragment(&state, Vec3::Z, Vec3::X, None, 0.5);
        assert!((c.x - 1.0).abs() < 1e-5);
        assert!((c.y - 0.25).abs() < 1e-5);
        assert_eq!(c.z, 0.0);
        assert_eq!(c.w, 1.0);
    }

    #[test]
    fn hidden_texture_falls_back_to_depth() {
        let state = MeshDrawState {
            show_texture: false,
            ..MeshDrawState::default()
        };
        let tex = Some(Vec4::new(0.0, 0.0, 1.0, 1.0));
        let c = shade_fragment(&state, Vec3::ONE, Vec3::ONE, tex, 0.0);
        assert!(c.x > c.z);
    }

    #[test]
    fn back_facing_gets_only_specular() {
        let state = MeshDrawState {
            light_dir: Vec3::Z,
            shininess: 1.0,
            ..MeshDrawState::default()
        };
        let tex = Some(Vec4::ONE);
        let c = shade_fragment(&state, -Vec3::Z, Vec3::Z, tex, 0.0);
        // Diffuse clamps to zero; |n.h| = 1 gives a white highlight.
        assert!((c.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn texture_modulated_by_diffuse() {
        let state = MeshDrawState {
            light_dir: Vec3::Z,
            shininess: 200.0,
            ..MeshDrawState::default()
        };
        let tex = Some(Vec4::new(0.5, 0.25, 1.0, 0.75));
        let c = shade_fragment(&state, Vec3::Z, Vec3::X, tex, 0.9);
        assert!((c.x - 0.5).abs() < 1e-3);
        assert!((c.y - 0.25).abs() < 1e-3);
        assert_eq!(c.w, 0.75);
    }
}
