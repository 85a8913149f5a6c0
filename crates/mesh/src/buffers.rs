use crate::MeshError;
use glam::{Vec2, Vec3};

/// Flat per-vertex arrays; every three vertices form one triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub vert_pos: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub normals: Vec<f32>,
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.vert_pos.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vert_pos.is_empty()
    }

    /// Check strides, matching vertex counts and whole triangles.
    pub fn validate(&self) -> Result<(), MeshError> {
        check_stride("vert_pos", self.vert_pos.len(), 3)?;
        check_stride("tex_coords", self.tex_coords.len(), 2)?;
        check_stride("normals", self.normals.len(), 3)?;

        let positions = self.vert_pos.len() / 3;
        let tex_coords = self.tex_coords.len() / 2;
        let normals = self.normals.len() / 3;
        if positions != tex_coords || positions != normals {
            return Err(MeshError::LengthMismatch {
                positions,
                tex_coords,
                normals,
            });
        }
        if positions % 3 != 0 {
            return Err(MeshError::PartialTriangle(positions));
        }
        Ok(())
    }

    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.vert_pos[i * 3..i * 3 + 3])
    }

    pub fn tex_coord(&self, i: usize) -> Vec2 {
        Vec2::from_slice(&self.tex_coords[i * 2..i * 2 + 2])
    }

    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.normals[i * 3..i * 3 + 3])
    }
}

fn check_stride(name: &'static str, len: usize, stride: usize) -> Result<(), MeshError> {
    if len % stride != 0 {
        return Err(MeshError::Stride { name, len, stride });
    }
    Ok(())
}
