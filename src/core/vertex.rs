use bytemuck::{Pod, Zeroable};

/// Chunk vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    /// Ambient occlusion level, 0 (fully occluded) to 3 (open).
    pub ao: f32,
}
