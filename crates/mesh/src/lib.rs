//! Triangle mesh input for the rasterizer.
//!
//! OBJ files are parsed into indexed form, normalised into a unit box, then
//! flattened into the triangle-soup arrays the draw path uploads: three floats
//! per position, two per texture coordinate, three per normal.
//!
//! # Invariants
//! - All three buffers describe the same number of vertices.
//! - The vertex count is a multiple of 3.

mod buffers;
mod obj;

pub use buffers::MeshBuffers;
pub use obj::{Aabb, FaceVertex, ObjMesh};

/// Errors from mesh loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("{name} buffer length {len} is not a multiple of {stride}")]
    Stride {
        name: &'static str,
        len: usize,
        stride: usize,
    },
    #[error("buffer vertex counts disagree: positions={positions}, tex_coords={tex_coords}, normals={normals}")]
    LengthMismatch {
        positions: usize,
        tex_coords: usize,
        normals: usize,
    },
    #[error("vertex count {0} is not a whole number of triangles")]
    PartialTriangle(usize),
}

pub fn crate_info() -> &'static str {
    "lumen-mesh v0.1.0"
}
