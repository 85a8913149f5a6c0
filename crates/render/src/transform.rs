use glam::{Mat3, Mat4, Vec4};

/// Model-view matrix: rotate about X, then about Y, then translate.
///
/// Angles are in radians.
pub fn model_view(tx: f32, ty: f32, tz: f32, rx: f32, ry: f32) -> Mat4 {
    let rotation = Mat4::from_rotation_y(ry) * Mat4::from_rotation_x(rx);
    Mat4::from_translation(glam::vec3(tx, ty, tz)) * rotation
}

/// Half-diagonal bound of the unit mesh box, used to fit the depth range.
const DEPTH_MARGIN: f32 = 1.74;
const MIN_NEAR: f32 = 0.001;

/// Perspective projection for a camera looking down +Z at an object
/// `trans_z` units away.
///
/// Near and far planes hug the normalised mesh. Depth maps to -1..1.
pub fn projection(aspect: f32, trans_z: f32, fov_deg: f32) -> Mat4 {
    let n = (trans_z - DEPTH_MARGIN).max(MIN_NEAR);
    let f = trans_z + DEPTH_MARGIN;
    let s = 1.0 / (fov_deg.to_radians() / 2.0).tan();
    Mat4::from_cols(
        Vec4::new(s / aspect, 0.0, 0.0, 0.0),
        Vec4::new(0.0, s, 0.0, 0.0),
        Vec4::new(0.0, 0.0, (n + f) / (f - n), 1.0),
        Vec4::new(0.0, 0.0, -2.0 * n * f / (f - n), 0.0),
    )
}

/// Inverse-transpose of the upper 3x3 of the model-view matrix.
pub fn normal_matrix(mv: Mat4) -> Mat3 {
    Mat3::from_mat4(mv).inverse().transpose()
}

/// Matrix exchanging the Y and Z axes, or the identity.
pub fn swap_yz_matrix(swap: bool) -> Mat4 {
    if !swap {
        return Mat4::IDENTITY;
    }
    Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::Y, Vec4::W)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, vec3};
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn rotation_x_applies_before_y() {
        let mv = model_view(0.0, 0.0, 0.0, FRAC_PI_2, FRAC_PI_2);
        // Rx(90) takes +Y to +Z, then Ry(90) takes +Z to +X.
        assert!(close(mv.transform_vector3(Vec3::Y), Vec3::X));
    }

    #[test]
    fn translation_applies_last() {
        let mv = model_view(1.0, 2.0, 3.0, 0.0, FRAC_PI_2);
        assert!(close(mv.transform_point3(Vec3::X), vec3(1.0, 2.0, 2.0)));
    }

    #[test]
    fn projection_maps_planes_to_ndc() {
        let trans_z = 3.0;
        let p = projection(1.0, trans_z, 60.0);
        let near = p * Vec4::new(0.0, 0.0, trans_z - DEPTH_MARGIN, 1.0);
        let far = p * Vec4::new(0.0, 0.0, trans_z + DEPTH_MARGIN, 1.0);
        assert!((near.z / near.w + 1.0).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn projection_clamps_near_plane() {
        let p = projection(1.0, 0.5, 60.0);
        let near = p * Vec4::new(0.0, 0.0, MIN_NEAR, 1.0);
        assert!((near.z / near.w + 1.0).abs() < 1e-3);
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let mv = Mat4::from_scale(vec3(2.0, 1.0, 1.0));
        let nt = normal_matrix(mv);
        // A plane x + y = 0 has normal (1,1,0); after scaling x by 2 the
        // surface normal leans toward y.
        let n = (nt * vec3(1.0, 1.0, 0.0)).normalize();
        assert!(n.y > n.x);
    }

    #[test]
    fn swap_exchanges_axes() {
        let m = swap_yz_matrix(true);
        assert_eq!(m.transform_point3(vec3(1.0, 2.0, 3.0)), vec3(1.0, 3.0, 2.0));
        assert_eq!(swap_yz_matrix(false), Mat4::IDENTITY);
    }
}
