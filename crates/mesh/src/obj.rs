use crate::{MeshBuffers, MeshError};
use glam::{Vec2, Vec3};
use std::path::Path;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}

/// One corner of a face: zero-based indices into the attribute lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVertex {
    pub position: usize,
    pub tex_coord: Option<usize>,
    pub normal: Option<usize>,
}

/// Indexed triangle mesh as read from a Wavefront OBJ file.
#[derive(Debug, Clone, Default)]
pub struct ObjMesh {
    pub positions: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub triangles: Vec<[FaceVertex; 3]>,
}

impl ObjMesh {
    /// Read and parse an OBJ file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mesh = Self::parse(&text)?;
        tracing::debug!(
            "loaded {}: {} positions, {} triangles",
            path.as_ref().display(),
            mesh.positions.len(),
            mesh.triangles.len()
        );
        Ok(mesh)
    }

    /// Parse OBJ text. Polygons are fan-triangulated; points, lines and
    /// records other than `v`, `vt`, `vn` and `f` are skipped. Every object
    /// and group in the file lands in one mesh.
    pub fn parse(text: &str) -> Result<Self, MeshError> {
        let text = canonical_records(text);
        // Multi-index mode keeps separate position, texcoord and normal
        // indices per corner.
        let options = tobj::LoadOptions {
            triangulate: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj_buf(
            &mut std::io::Cursor::new(text.as_bytes()),
            &options,
            |_| Ok(Default::default()),
        )?;

        let mut mesh = ObjMesh::default();
        for model in &models {
            mesh.append(&model.mesh);
        }
        Ok(mesh)
    }

    /// Append a tobj mesh, offsetting its indices past what is already here.
    fn append(&mut self, src: &tobj::Mesh) {
        let p0 = self.positions.len();
        let t0 = self.tex_coords.len();
        let n0 = self.normals.len();

        let positions = src.positions.chunks_exact(3).map(Vec3::from_slice);
        self.positions.extend(positions);
        let tex_coords = src.texcoords.chunks_exact(2).map(Vec2::from_slice);
        self.tex_coords.extend(tex_coords);
        let normals = src.normals.chunks_exact(3).map(Vec3::from_slice);
        self.normals.extend(normals);

        // Attribute index lists are either per corner or empty.
        let has_tex = src.texcoord_indices.len() == src.indices.len();
        let has_normal = src.normal_indices.len() == src.indices.len();
        let corner = |i: usize| FaceVertex {
            position: p0 + src.indices[i] as usize,
            tex_coord: has_tex.then(|| t0 + src.texcoord_indices[i] as usize),
            normal: has_normal.then(|| n0 + src.normal_indices[i] as usize),
        };
        for f in 0..src.indices.len() / 3 {
            let i = 3 * f;
            self.triangles.push([corner(i), corner(i + 1), corner(i + 2)]);
        }
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        let first = *self.positions.first()?;
        let (min, max) = self
            .positions
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Aabb { min, max })
    }

    /// Apply `p' = (p + shift) * scale` to every position.
    pub fn shift_and_scale(&mut self, shift: Vec3, scale: f32) {
        for p in &mut self.positions {
            *p = (*p + shift) * scale;
        }
    }

    /// Centre the mesh at the origin and scale its largest extent to 1.
    pub fn normalize_to_unit_box(&mut self) {
        let Some(aabb) = self.bounding_box() else {
            return;
        };
        let size = aabb.extent().max_element();
        let scale = if size > 0.0 { 1.0 / size } else { 1.0 };
        self.shift_and_scale(-aabb.center(), scale);
    }

    pub fn has_tex_coords(&self) -> bool {
        self.triangles
            .iter()
            .any(|tri| tri.iter().any(|c| c.tex_coord.is_some()))
    }

    pub fn has_normals(&self) -> bool {
        self.triangles
            .iter()
            .any(|tri| tri.iter().any(|c| c.normal.is_some()))
    }

    /// Flatten into per-vertex triangle-soup arrays.
    ///
    /// Missing texture coordinates become (0, 0); missing normals fall back to
    /// the face normal.
    pub fn to_buffers(&self) -> MeshBuffers {
        let vertex_count = self.triangles.len() * 3;
        let mut out = MeshBuffers {
            vert_pos: Vec::with_capacity(vertex_count * 3),
            tex_coords: Vec::with_capacity(vertex_count * 2),
            normals: Vec::with_capacity(vertex_count * 3),
        };
        let mut degenerate = 0usize;

        for tri in &self.triangles {
            let [a, b, c] = tri.map(|fv| self.positions[fv.position]);
            let face_normal = (b - a).cross(c - a).try_normalize().unwrap_or_else(|| {
                degenerate += 1;
                Vec3::Z
            });

            for fv in tri {
                let p = self.positions[fv.position];
                let t = fv.tex_coord.map_or(Vec2::ZERO, |i| self.tex_coords[i]);
                let n = fv.normal.map_or(face_normal, |i| self.normals[i]);
                out.vert_pos.extend_from_slice(&p.to_array());
                out.tex_coords.extend_from_slice(&t.to_array());
                out.normals.extend_from_slice(&n.to_array());
            }
        }

        if degenerate > 0 {
            tracing::warn!("{degenerate} zero-area triangles given a default normal");
        }
        out
    }
}

/// Strip comments, join backslash-continued lines and give one-component
/// `vt` records a zero `v`.
fn canonical_records(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();

    for raw in text.lines() {
        let line = raw.split_once('#').map_or(raw, |(head, _)| head);
        if let Some(head) = line.trim_end().strip_suffix('\\') {
            pending.push_str(head);
            pending.push(' ');
            continue;
        }
        pending.push_str(line);

        let short_vt = {
            let mut words = pending.split_whitespace();
            words.next() == Some("vt") && words.count() == 1
        };
        if short_vt {
            pending.push_str(" 0");
        }
        out.push_str(pending.trim());
        out.push('\n');
        pending.clear();
    }
    if !pending.trim().is_empty() {
        out.push_str(pending.trim());
        out.push('\n');
    }
    out
}
