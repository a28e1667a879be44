use glam::IVec3;

use crate::core::vertex::Vertex;

/// Vertex and index list for one render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Staging geometry of a chunk plus the index used by picking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub opaque: MeshBuffers,
    pub translucent: MeshBuffers,
    /// World positions of every voxel that produced at least one face.
    pub visible_blocks: Vec<IVec3>,
}

impl ChunkMesh {
    pub fn face_count(&self) -> usize {
        (self.opaque.indices.len() + self.translucent.indices.len()) / 6
    }
}

pub fn add_quad(
    buffers: &mut MeshBuffers,
    corners: [[f32; 3]; 4],
    uvs: [[f32; 2]; 4],
    normal: [f32; 3],
    ao: [u8; 4],
) {
    let base_idx = buffers.vertices.len() as u32;
    for i in 0..4 {
        buffers.vertices.push(Vertex {
            position: corners[i],
            uv: uvs[i],
            normal,
            ao: ao[i] as f32,
        });
    }
    buffers.indices.extend_from_slice(&[
        base_idx,
        base_idx + 1,
        base_idx + 2,
        base_idx + 2,
        base_idx + 3,
        base_idx,
    ]);
}
