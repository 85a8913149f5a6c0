use crate::SceneError;
use glam::{Vec2, Vec3};
use lumen_render::Texture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Cube map face image paths, relative to the scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeFaces {
    pub pos_x: PathBuf,
    pub neg_x: PathBuf,
    pub pos_y: PathBuf,
    pub neg_y: PathBuf,
    pub pos_z: PathBuf,
    pub neg_z: PathBuf,
}

impl CubeFaces {
    /// Faces in GPU layer order: +X, -X, +Y, -Y, +Z, -Z.
    pub fn ordered(&self) -> [&Path; 6] {
        [
            &self.pos_x,
            &self.neg_x,
            &self.pos_y,
            &self.neg_y,
            &self.pos_z,
            &self.neg_z,
        ]
    }
}

/// Background seen by rays that leave the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Environment {
    Solid { color: Vec3 },
    Gradient { horizon: Vec3, zenith: Vec3 },
    CubeMap { faces: CubeFaces },
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Gradient {
            horizon: Vec3::new(0.85, 0.9, 1.0),
            zenith: Vec3::new(0.25, 0.45, 0.85),
        }
    }
}

impl Environment {
    /// Load any images the environment refers to.
    pub fn resolve(&self, base_dir: &Path) -> Result<EnvironmentMap, SceneError> {
        Ok(match self {
            Environment::Solid { color } => EnvironmentMap::Solid(*color),
            Environment::Gradient { horizon, zenith } => EnvironmentMap::Gradient {
                horizon: *horizon,
                zenith: *zenith,
            },
            Environment::CubeMap { faces } => {
                let mut loaded = Vec::with_capacity(6);
                for face in faces.ordered() {
                    loaded.push(Texture::load(base_dir.join(face))?);
                }
                EnvironmentMap::CubeMap(CubeMap::new(loaded)?)
            }
        })
    }
}

/// Six square faces in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug, Clone)]
pub struct CubeMap {
    faces: Vec<Texture>,
}

impl CubeMap {
    pub fn new(faces: Vec<Texture>) -> Result<Self, SceneError> {
        if faces.len() != 6 {
            return Err(SceneError::Invalid(format!(
                "cube map needs 6 faces, got {}",
                faces.len()
            )));
        }
        let size = faces[0].width();
        if faces.iter().any(|f| f.width() != size || f.height() != size) {
            return Err(SceneError::Invalid(
                "cube map faces must be square and equally sized".into(),
            ));
        }
        Ok(Self { faces })
    }

    pub fn faces(&self) -> &[Texture] {
        &self.faces
    }

    /// Face index and (s, t) coordinates for a direction, with t running
    /// down the face image.
    pub fn face_coords(dir: Vec3) -> (usize, Vec2) {
        let a = dir.abs();
        let (face, sc, tc, ma) = if a.x >= a.y && a.x >= a.z {
            if dir.x > 0.0 {
                (0, -dir.z, -dir.y, a.x)
            } else {
                (1, dir.z, -dir.y, a.x)
            }
        } else if a.y >= a.z {
            if dir.y > 0.0 {
                (2, dir.x, dir.z, a.y)
            } else {
                (3, dir.x, -dir.z, a.y)
            }
        } else if dir.z > 0.0 {
            (4, dir.x, -dir.y, a.z)
        } else {
            (5, -dir.x, -dir.y, a.z)
        };
        let ma = ma.max(f32::MIN_POSITIVE);
        (face, Vec2::new((sc / ma + 1.0) * 0.5, (tc / ma + 1.0) * 0.5))
    }

    pub fn sample(&self, dir: Vec3) -> Vec3 {
        let (face, st) = Self::face_coords(dir);
        // Texture::sample counts v from the bottom row.
        self.faces[face]
            .sample(Vec2::new(st.x, 1.0 - st.y))
            .truncate()
    }
}

/// Environment ready for lookups.
#[derive(Debug, Clone)]
pub enum EnvironmentMap {
    Solid(Vec3),
    Gradient { horizon: Vec3, zenith: Vec3 },
    CubeMap(CubeMap),
}

impl EnvironmentMap {
    /// Radiance arriving from `dir` (scene space, Z-up).
    ///
    /// Cube maps are Y-up, so the direction is swizzled to xzy first.
    pub fn lookup(&self, dir: Vec3) -> Vec3 {
        let d = Vec3::new(dir.x, dir.z, dir.y);
        match self {
            EnvironmentMap::Solid(color) => *color,
            EnvironmentMap::Gradient { horizon, zenith } => {
                let up = d.normalize_or_zero().y.max(0.0);
                horizon.lerp(*zenith, up)
            }
            EnvironmentMap::CubeMap(cube) => cube.sample(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coloured_cube() -> CubeMap {
        let colours = [
            [255, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
            [255, 255, 0, 255],
            [0, 255, 255, 255],
            [255, 0, 255, 255],
        ];
        CubeMap::new(colours.iter().map(|c| Texture::solid(*c)).collect()).unwrap()
    }

    #[test]
    fn face_selection_by_major_axis() {
        assert_eq!(CubeMap::face_coords(Vec3::X).0, 0);
        assert_eq!(CubeMap::face_coords(-Vec3::X).0, 1);
        assert_eq!(CubeMap::face_coords(Vec3::Y).0, 2);
        assert_eq!(CubeMap::face_coords(-Vec3::Y).0, 3);
        assert_eq!(CubeMap::face_coords(Vec3::Z).0, 4);
        assert_eq!(CubeMap::face_coords(-Vec3::Z).0, 5);
    }

    #[test]
    fn face_centre_maps_to_half() {
        let (_, st) = CubeMap::face_coords(Vec3::new(0.0, 0.0, 3.0));
        assert!((st - Vec2::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn scene_up_reads_cube_top_face() {
        let env = EnvironmentMap::CubeMap(coloured_cube());
        // Scene +Z becomes cube +Y after the swizzle.
        let c = env.lookup(Vec3::Z);
        assert!((c - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
        let c = env.lookup(Vec3::Y);
        assert!((c - Vec3::new(0.0, 1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn gradient_runs_horizon_to_zenith() {
        let env = EnvironmentMap::Gradient {
            horizon: Vec3::ONE,
            zenith: Vec3::ZERO,
        };
        assert_eq!(env.lookup(Vec3::X), Vec3::ONE);
        assert_eq!(env.lookup(Vec3::Z), Vec3::ZERO);
        assert_eq!(env.lookup(-Vec3::Z), Vec3::ONE);
    }

    #[test]
    fn cube_needs_six_square_faces() {
        assert!(CubeMap::new(vec![Texture::solid([0; 4]); 5]).is_err());
        let mut faces = vec![Texture::solid([0; 4]); 5];
        faces.push(Texture::from_rgba8(2, 1, vec![0; 8]).unwrap());
        assert!(CubeMap::new(faces).is_err());
    }

    #[test]
    fn environment_yaml_is_tagged() {
        let env: Environment =
            serde_yaml::from_str("kind: solid\ncolor: [0.1, 0.2, 0.3]\n").unwrap();
        assert_eq!(
            env,
            Environment::Solid {
                color: Vec3::new(0.1, 0.2, 0.3)
            }
        );
    }
}
