//! World generation and management modules
//! Contains terrain generation, the chunk store, the background worker and
//! view-distance streaming.

pub mod generator;
pub mod picking;
pub mod store;
pub mod streamer;
pub mod structures;
pub mod worker;

// Re-export commonly used types
pub use generator::TerrainGenerator;
pub use picking::{BlockHit, pick_block};
pub use store::{BlockDescriptor, ChunkStore, Neighborhood, SharedChunk};
pub use streamer::{ChunkStreamer, DrawList, StreamStats};
pub use worker::{JobHandle, JobKind, JobOutcome, JobStatus, MeshWorker};
