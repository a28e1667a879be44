//! Core data structures for the engine
//! Contains blocks, chunk coordinates, chunks and vertices.

pub mod access;
pub mod block;
pub mod chunk;
pub mod coords;
pub mod vertex;

// Re-export commonly used types
pub use access::BlockAccess;
pub use block::{BlockType, Face};
pub use chunk::{BlockGrid, Chunk, ChunkState};
pub use coords::ChunkPos;
pub use vertex::Vertex;
