use crate::environment::EnvironmentMap;
use crate::scene::Scene;
use crate::sphere::intersect_ray;
use crate::SceneError;
use glam::{Vec3, Vec4};
use lumen_common::{Material, Ray};
use lumen_render::Framebuffer;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

/// Hard cap on reflection rays per pixel, whatever the scene asks for.
pub const MAX_BOUNCES: u32 = 64;

/// Output options for whole-image renders.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Keep alpha 0 where primary rays miss every sphere.
    pub background_alpha: bool,
}

/// Scene plus resolved environment, ready to trace.
#[derive(Debug, Clone)]
pub struct RayTracer {
    scene: Scene,
    environment: EnvironmentMap,
}

impl RayTracer {
    pub fn new(scene: Scene, environment: EnvironmentMap) -> Self {
        if scene.bounce_limit > MAX_BOUNCES {
            tracing::warn!(
                "bounce limit {} capped at {MAX_BOUNCES}",
                scene.bounce_limit
            );
        }
        Self { scene, environment }
    }

    /// Resolve the scene's environment relative to `base_dir` and build a tracer.
    pub fn from_scene(scene: Scene, base_dir: &Path) -> Result<Self, SceneError> {
        let environment = scene.environment.resolve(base_dir)?;
        Ok(Self::new(scene, environment))
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn set_bounce_limit(&mut self, limit: u32) {
        self.scene.bounce_limit = limit;
    }

    fn bounce_limit(&self) -> u32 {
        self.scene.bounce_limit.min(MAX_BOUNCES)
    }

    /// Blinn-Phong from every light not blocked by a sphere.
    pub fn shade(&self, mtl: &Material, position: Vec3, normal: Vec3, view: Vec3) -> Vec3 {
        let v = view.normalize_or_zero();
        let mut color = Vec3::ZERO;

        for light in &self.scene.lights {
            let dir = (light.position - position).normalize_or_zero();
            let shadow = Ray::new(position, dir);
            if intersect_ray(&self.scene.spheres, &shadow).is_some() {
                continue;
            }

            let h = (dir + v).normalize_or_zero();
            color += mtl.k_d * light.intensity * normal.dot(dir).max(0.0);
            color += mtl.k_s * light.intensity * normal.dot(h).max(0.0).powf(mtl.n);
        }
        color
    }

    /// Colour seen along a ray. Alpha is 0 when the ray escapes to the
    /// environment without hitting anything.
    pub fn trace(&self, ray: &Ray) -> Vec4 {
        let Some(mut hit) = intersect_ray(&self.scene.spheres, ray) else {
            return self.environment.lookup(ray.dir).extend(0.0);
        };

        let mut view = (-ray.dir).normalize();
        let mut color = self.shade(&hit.mtl, hit.position, hit.normal, view);
        let mut k_s = hit.mtl.k_s;

        for _ in 0..self.bounce_limit() {
            if !hit.mtl.is_reflective() {
                break;
            }

            let dir = (2.0 * view.dot(hit.normal) * hit.normal - view).normalize();
            let reflected = Ray::new(hit.position, dir);

            match intersect_ray(&self.scene.spheres, &reflected) {
                Some(next) => {
                    view = -dir;
                    color += k_s * self.shade(&next.mtl, next.position, next.normal, view);
                    k_s *= next.mtl.k_s;
                    hit = next;
                }
                None => {
                    color += k_s * self.environment.lookup(dir);
                    break;
                }
            }
        }

        color.extend(1.0)
    }

    /// Trace one primary ray per pixel, rows in parallel.
    pub fn render(&self, width: u32, height: u32, options: RenderOptions) -> Framebuffer {
        let start = Instant::now();
        let camera = self.scene.camera;

        let pixels: Vec<Vec4> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..width).map(move |x| {
                    let mut c = self.trace(&camera.primary_ray(x, y, width, height));
                    if !options.background_alpha {
                        c.w = 1.0;
                    }
                    c
                })
            })
            .collect();

        tracing::info!(
            "traced {width}x{height} ({} spheres, {} lights, {} bounces) in {:?}",
            self.scene.spheres.len(),
            self.scene.lights.len(),
            self.bounce_limit(),
            start.elapsed()
        );
        Framebuffer::from_pixels(width, height, pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::sphere::Sphere;
    use lumen_common::PointLight;

    const SKY: Vec3 = Vec3::new(0.1, 0.2, 0.3);
    const S: f32 = std::f32::consts::FRAC_1_SQRT_2;

    fn scene(spheres: Vec<Sphere>, lights: Vec<PointLight>, bounce_limit: u32) -> Scene {
        Scene {
            spheres,
            lights,
            environment: Environment::Solid { color: SKY },
            bounce_limit,
            camera: Default::default(),
        }
    }

    fn tracer(scene: Scene) -> RayTracer {
        RayTracer::new(scene, EnvironmentMap::Solid(SKY))
    }

    fn matte(center: Vec3, radius: f32, k_d: Vec3) -> Sphere {
        Sphere {
            center,
            radius,
            mtl: Material {
                k_d,
                k_s: Vec3::ZERO,
                n: 1.0,
            },
        }
    }

    fn mirror(center: Vec3, radius: f32, k_s: Vec3) -> Sphere {
        Sphere {
            center,
            radius,
            mtl: Material {
                k_d: Vec3::ZERO,
                k_s,
                n: 1.0,
            },
        }
    }

    #[test]
    fn miss_returns_environment_with_zero_alpha() {
        let rt = tracer(scene(vec![], vec![], 3));
        assert_eq!(rt.trace(&Ray::new(Vec3::ZERO, Vec3::X)), SKY.extend(0.0));
    }

    #[test]
    fn lit_matte_point_is_lambertian() {
        let light = PointLight {
            position: Vec3::new(0.0, 0.0, -10.0),
            intensity: Vec3::ONE,
        };
        let rt = tracer(scene(
            vec![matte(Vec3::ZERO, 1.0, Vec3::new(0.5, 0.25, 0.0))],
            vec![light],
            0,
        ));
        let c = rt.trace(&Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z));
        assert!((c - Vec4::new(0.5, 0.25, 0.0, 1.0)).length() < 1e-4);
    }

    #[test]
    fn occluded_light_casts_shadow() {
        let light = PointLight {
            position: Vec3::new(0.0, 0.0, -10.0),
            intensity: Vec3::ONE,
        };
        let target = matte(Vec3::ZERO, 1.0, Vec3::ONE);
        let blocker = matte(Vec3::new(0.0, 0.0, -5.0), 0.5, Vec3::ONE);
        let rt = tracer(scene(vec![target, blocker], vec![light], 0));

        // The target's pole faces the light but sits behind the blocker.
        let shaded = rt.shade(&target.mtl, Vec3::new(0.0, 0.0, -1.0), -Vec3::Z, -Vec3::Z);
        assert_eq!(shaded, Vec3::ZERO);

        // The blocker itself faces the light and is lit.
        let c = rt.trace(&Ray::new(Vec3::new(0.0, 0.0, -8.0), Vec3::Z));
        assert!((c.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn mirror_reflects_environment_scaled_by_ks() {
        let rt = tracer(scene(
            vec![mirror(Vec3::ZERO, 1.0, Vec3::splat(0.5))],
            vec![],
            1,
        ));
        let c = rt.trace(&Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z));
        assert!((c.truncate() - SKY * 0.5).length() < 1e-5);
        assert_eq!(c.w, 1.0);
    }

    #[test]
    fn zero_bounce_limit_skips_reflections() {
        let rt = tracer(scene(
            vec![mirror(Vec3::ZERO, 1.0, Vec3::splat(0.5))],
            vec![],
            0,
        ));
        let c = rt.trace(&Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z));
        assert_eq!(c, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn facing_mirrors_never_reach_the_sky() {
        // A ray along the axis between two mirrors bounces until the limit
        // and never picks up the environment.
        let a = mirror(Vec3::new(0.0, 0.0, 3.0), 1.0, Vec3::splat(0.5));
        let b = mirror(Vec3::new(0.0, 0.0, -3.0), 1.0, Vec3::splat(0.5));
        let rt = tracer(scene(vec![a, b], vec![], 4));
        let c = rt.trace(&Ray::new(Vec3::ZERO, Vec3::Z));
        assert_eq!(c, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn light_is_blocked_by_sphere_behind_it() {
        let light = PointLight {
            position: Vec3::new(0.0, 0.0, -3.0),
            intensity: Vec3::ONE,
        };
        let target = matte(Vec3::ZERO, 1.0, Vec3::ONE);
        let pole = Vec3::new(0.0, 0.0, -1.0);

        let open = tracer(scene(vec![target], vec![light], 0));
        let lit = open.shade(&target.mtl, pole, -Vec3::Z, -Vec3::Z);
        assert!((lit.x - 1.0).abs() < 1e-5);

        // The shadow ray is a ray, not a segment: a sphere past the light
        // still blocks it.
        let beyond = matte(Vec3::new(0.0, 0.0, -6.0), 1.0, Vec3::ONE);
        let rt = tracer(scene(vec![target, beyond], vec![light], 0));
        let shaded = rt.shade(&target.mtl, pole, -Vec3::Z, -Vec3::Z);
        assert_eq!(shaded, Vec3::ZERO);
    }

    /// Straight down onto a unit mirror at the origin, hitting where the
    /// normal is 45 degrees off vertical, so the reflection leaves along +X
    /// from (S, 0, S).
    fn down_onto_first_mirror() -> Ray {
        Ray::new(Vec3::new(S, 0.0, 5.0), -Vec3::Z)
    }

    #[test]
    fn specular_factor_multiplies_along_the_path() {
        let k_s1 = Vec3::new(0.5, 0.25, 1.0);
        let k_s2 = Vec3::new(0.5, 1.0, 0.5);
        let first = mirror(Vec3::ZERO, 1.0, k_s1);
        // Hit at its own 45 degree point, turning the ray straight up.
        let second = mirror(Vec3::new(4.0, 0.0, 0.0), 1.0, k_s2);

        let one = tracer(scene(vec![first, second], vec![], 1));
        let c = one.trace(&down_onto_first_mirror());
        assert_eq!(c, Vec4::new(0.0, 0.0, 0.0, 1.0));

        let two = tracer(scene(vec![first, second], vec![], 2));
        let c = two.trace(&down_onto_first_mirror());
        let expected = SKY * k_s1 * k_s2;
        let err = (c.truncate() - expected).length();
        assert!(err < 1e-4, "{c} vs {expected}");
    }

    #[test]
    fn reflected_hit_is_shaded_from_the_reflection() {
        let first = mirror(Vec3::ZERO, 1.0, Vec3::ONE);
        // Shiny but black: only the specular term shows. Hit head-on at
        // (3, 0, S) with normal -X.
        let seen = Sphere {
            center: Vec3::new(4.0, 0.0, S),
            radius: 1.0,
            mtl: Material {
                k_d: Vec3::ZERO,
                k_s: Vec3::ONE,
                n: 1.0,
            },
        };
        let q = Vec3::new(3.0, 0.0, S);
        let light = PointLight {
            position: q + 2.0 * Vec3::new(-S, 0.0, S),
            intensity: Vec3::ONE,
        };
        let rt = tracer(scene(vec![first, seen], vec![light], 1));

        let p = Vec3::new(S, 0.0, S);
        let at_mirror = rt.shade(&first.mtl, p, p, Vec3::Z);
        let along_reflection = rt.shade(&seen.mtl, q, -Vec3::X, -Vec3::X);
        let along_primary = rt.shade(&seen.mtl, q, -Vec3::X, Vec3::Z);
        // cos 22.5 and cos 67.5 degrees.
        assert!((along_reflection.x - 0.9239).abs() < 1e-3);
        assert!((along_primary.x - 0.3827).abs() < 1e-3);

        let c = rt.trace(&down_onto_first_mirror()).truncate();
        let expected = at_mirror + along_reflection;
        assert!((c - expected).length() < 1e-3, "{c} vs {expected}");
    }

    #[test]
    fn matte_surface_ends_reflection_path() {
        let floor = matte(Vec3::new(0.0, 0.0, -101.0), 100.0, Vec3::ZERO);
        let ball = mirror(Vec3::ZERO, 1.0, Vec3::ONE);
        let rt = tracer(scene(vec![floor, ball], vec![], 10));

        // Straight down onto the ball: reflects straight up into the sky.
        let c = rt.trace(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z));
        assert!((c.truncate() - SKY).length() < 1e-5);

        // Straight down onto the matte floor: no reflection is traced.
        let c = rt.trace(&Ray::new(Vec3::new(5.0, 0.0, 5.0), -Vec3::Z));
        assert_eq!(c, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn bounce_limit_is_capped() {
        let mut rt = tracer(scene(vec![], vec![], 1_000));
        assert_eq!(rt.bounce_limit(), MAX_BOUNCES);
        rt.set_bounce_limit(2);
        assert_eq!(rt.bounce_limit(), 2);
    }

    #[test]
    fn render_fills_alpha_unless_requested() {
        let rt = tracer(scene(vec![], vec![], 0));
        let opaque = rt.render(4, 3, RenderOptions::default());
        assert_eq!(opaque.pixel(3, 2).w, 1.0);
        let keyed = rt.render(4, 3, RenderOptions { background_alpha: true });
        assert_eq!(keyed.pixel(3, 2).w, 0.0);
        assert_eq!((keyed.width(), keyed.height()), (4, 3));
    }
}
