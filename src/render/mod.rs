//! Rendering-related modules
//! Contains mesh building, atlas lookup, frustum culling and the upload seam.

pub mod atlas;
pub mod frustum;
pub mod mesh;
pub mod mesher;
pub mod upload;

// Re-export commonly used types
pub use atlas::AtlasLayout;
pub use frustum::{AABB, extract_frustum_planes};
pub use mesh::{ChunkMesh, MeshBuffers, add_quad};
pub use mesher::build_chunk_mesh;
pub use upload::{HeadlessUploader, MeshUploader};
