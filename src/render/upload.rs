//! Hand-off point between finished chunk geometry and the renderer.

use rustc_hash::FxHashMap;

use crate::core::coords::ChunkPos;
use crate::render::mesh::ChunkMesh;

/// Receives chunk geometry on the thread driving the streamer.
pub trait MeshUploader {
    /// Replaces any buffers previously uploaded for `pos`.
    fn upload(&mut self, pos: ChunkPos, mesh: &ChunkMesh);

    /// Frees the buffers of an evicted chunk.
    fn release(&mut self, pos: ChunkPos);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadedBuffers {
    pub opaque_bytes: usize,
    pub opaque_indices: u32,
    pub translucent_bytes: usize,
    pub translucent_indices: u32,
}

/// Uploader without a GPU. Records what would have been sent.
#[derive(Default)]
pub struct HeadlessUploader {
    pub buffers: FxHashMap<ChunkPos, UploadedBuffers>,
    pub uploads: usize,
    pub releases: usize,
}

impl HeadlessUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_bytes(&self) -> usize {
        self.buffers
            .values()
            .map(|b| b.opaque_bytes + b.translucent_bytes)
            .sum()
    }
}

impl MeshUploader for HeadlessUploader {
    fn upload(&mut self, pos: ChunkPos, mesh: &ChunkMesh) {
        let buffers = UploadedBuffers {
            opaque_bytes: mesh.opaque.vertex_bytes().len() + mesh.opaque.index_bytes().len(),
            opaque_indices: mesh.opaque.index_count(),
            translucent_bytes: mesh.translucent.vertex_bytes().len()
                + mesh.translucent.index_bytes().len(),
            translucent_indices: mesh.translucent.index_count(),
        };
        self.buffers.insert(pos, buffers);
        self.uploads += 1;
    }

    fn release(&mut self, pos: ChunkPos) {
        if self.buffers.remove(&pos).is_some() {
            self.releases += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vertex::Vertex;
    use crate::render::mesh::add_quad;

    #[test]
    fn test_headless_uploader_tracks_buffer_sizes() {
        let mut mesh = ChunkMesh::default();
        add_quad(&mut mesh.opaque, [[0.0; 3]; 4], [[0.0; 2]; 4], [0.0, 1.0, 0.0], [3; 4]);

        let mut uploader = HeadlessUploader::new();
        let pos = ChunkPos::new(1, 2);
        uploader.upload(pos, &mesh);

        let expected = 4 * std::mem::size_of::<Vertex>() + 6 * 4;
        assert_eq!(uploader.buffers[&pos].opaque_bytes, expected);
        assert_eq!(uploader.buffers[&pos].opaque_indices, 6);
        assert_eq!(uploader.total_bytes(), expected);

        uploader.release(pos);
        uploader.release(pos);
        assert_eq!(uploader.releases, 1);
        assert!(uploader.buffers.is_empty());
    }
}
