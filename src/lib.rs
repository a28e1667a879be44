// Core module with fundamental types
pub mod core;

// Render module with meshing and draw ordering
pub mod render;

// World module with generation, storage and streaming
pub mod world;

// Settings persistence
pub mod utils;

// Other modules
pub mod constants;
pub mod error;

// Re-exports
pub use crate::constants::*;
pub use crate::core::{BlockAccess, BlockType, Chunk, ChunkPos, ChunkState, Face, Vertex};
pub use crate::error::EngineError;
pub use crate::render::{AABB, ChunkMesh, HeadlessUploader, MeshUploader, extract_frustum_planes};
pub use crate::utils::{EngineSettings, GenerationMode};
pub use crate::world::{BlockDescriptor, ChunkStore, ChunkStreamer, StreamStats, TerrainGenerator};
