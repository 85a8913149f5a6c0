use glam::Vec3;
use lumen_common::{Material, Ray};
use serde::{Deserialize, Serialize};

/// Minimum accepted ray parameter.
pub const BIAS: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    #[serde(default)]
    pub mtl: Material,
}

/// Closest intersection found along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitInfo {
    pub t: f32,
    pub position: Vec3,
    pub normal: Vec3,
    pub mtl: Material,
}

impl Sphere {
    /// Parameter of the entering intersection, if it lies beyond [`BIAS`].
    ///
    /// Only the nearer root of `a t^2 + b t + c = 0` is considered.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.pos - self.center;
        let a = ray.dir.dot(ray.dir);
        let b = 2.0 * ray.dir.dot(oc);
        let c = oc.dot(oc) - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let t = -(b + discriminant.sqrt()) / (2.0 * a);
        (t > BIAS).then_some(t)
    }
}

/// Intersect a ray with every sphere and keep the nearest hit.
pub fn intersect_ray(spheres: &[Sphere], ray: &Ray) -> Option<HitInfo> {
    let mut best: Option<(f32, &Sphere)> = None;
    for sphere in spheres {
        if let Some(t) = sphere.intersect(ray) {
            if best.is_none_or(|(closest, _)| t < closest) {
                best = Some((t, sphere));
            }
        }
    }

    best.map(|(t, sphere)| {
        let position = ray.at(t);
        HitInfo {
            t,
            position,
            normal: (position - sphere.center).normalize(),
            mtl: sphere.mtl,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(center: Vec3, radius: f32) -> Sphere {
        Sphere {
            center,
            radius,
            mtl: Material::default(),
        }
    }

    #[test]
    fn head_on_hit() {
        let s = sphere(Vec3::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!((s.intersect(&ray).unwrap() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn unnormalised_direction_scales_t() {
        let s = sphere(Vec3::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z * 2.0);
        assert!((s.intersect(&ray).unwrap() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn miss_and_behind() {
        let s = sphere(Vec3::new(0.0, 0.0, 5.0), 1.0);
        assert!(s.intersect(&Ray::new(Vec3::ZERO, Vec3::X)).is_none());
        assert!(s.intersect(&Ray::new(Vec3::ZERO, -Vec3::Z)).is_none());
    }

    #[test]
    fn inside_sphere_does_not_hit() {
        let s = sphere(Vec3::ZERO, 2.0);
        assert!(s.intersect(&Ray::new(Vec3::ZERO, Vec3::X)).is_none());
    }

    #[test]
    fn surface_start_is_biased_away() {
        let s = sphere(Vec3::ZERO, 1.0);
        // Leaving the surface outward must not re-hit it.
        assert!(s.intersect(&Ray::new(Vec3::X, Vec3::X)).is_none());
    }

    #[test]
    fn nearest_sphere_wins() {
        let mut near = sphere(Vec3::new(0.0, 0.0, 3.0), 1.0);
        near.mtl.k_d = Vec3::X;
        let far = sphere(Vec3::new(0.0, 0.0, 10.0), 1.0);
        let hit = intersect_ray(&[far, near], &Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert_eq!(hit.mtl.k_d, Vec3::X);
        assert!((hit.normal - (-Vec3::Z)).length() < 1e-5);
        assert!((hit.position - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn empty_scene_never_hits() {
        assert!(intersect_ray(&[], &Ray::new(Vec3::ZERO, Vec3::Z)).is_none());
    }
}
