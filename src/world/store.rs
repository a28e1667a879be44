//! Thread-safe map of resident chunks.
//!
//! The map mutex guards structure only (insert, remove, lookup). Chunk
//! contents sit behind their own `RwLock`; the map lock is never held while a
//! chunk lock is taken.

use std::sync::Arc;

use glam::IVec3;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::constants::*;
use crate::core::access::BlockAccess;
use crate::core::block::BlockType;
use crate::core::chunk::{Chunk, ChunkState};
use crate::core::coords::ChunkPos;

pub type SharedChunk = Arc<RwLock<Chunk>>;

/// A block together with where it lives.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlockDescriptor {
    pub world: IVec3,
    pub chunk: ChunkPos,
    pub local: IVec3,
    pub block: BlockType,
}

impl BlockDescriptor {
    pub fn new(world: IVec3, block: BlockType) -> Self {
        let chunk = ChunkPos::from_world(world);
        BlockDescriptor {
            world,
            chunk,
            local: chunk.local_position(world),
            block,
        }
    }

    pub fn with_block(self, block: BlockType) -> Self {
        BlockDescriptor { block, ..self }
    }
}

#[derive(Default)]
pub struct ChunkStore {
    chunks: Mutex<FxHashMap<ChunkPos, SharedChunk>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh chunk at `pos`. Returns `None` if one already exists.
    pub fn create_chunk(&self, pos: ChunkPos) -> Option<SharedChunk> {
        let mut chunks = self.chunks.lock();
        if chunks.contains_key(&pos) {
            return None;
        }
        let chunk = Arc::new(RwLock::new(Chunk::new(pos)));
        chunks.insert(pos, Arc::clone(&chunk));
        Some(chunk)
    }

    /// Removes the map entry. Other holders keep the chunk alive until they
    /// drop it.
    pub fn destroy_chunk(&self, pos: ChunkPos) -> Option<SharedChunk> {
        self.chunks.lock().remove(&pos)
    }

    pub fn chunk_exists(&self, pos: ChunkPos) -> bool {
        self.chunks.lock().contains_key(&pos)
    }

    pub fn get_chunk(&self, pos: ChunkPos) -> Option<SharedChunk> {
        self.chunks.lock().get(&pos).cloned()
    }

    /// True while `chunk` is still the instance stored at `pos`.
    pub fn holds(&self, pos: ChunkPos, chunk: &SharedChunk) -> bool {
        self.chunks
            .lock()
            .get(&pos)
            .is_some_and(|stored| Arc::ptr_eq(stored, chunk))
    }

    pub fn chunk_state(&self, pos: ChunkPos) -> Option<ChunkState> {
        let chunk = self.get_chunk(pos)?;
        let state = chunk.read().state();
        Some(state)
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.lock().is_empty()
    }

    pub fn positions(&self) -> Vec<ChunkPos> {
        self.chunks.lock().keys().copied().collect()
    }

    pub fn snapshot(&self) -> Vec<(ChunkPos, SharedChunk)> {
        self.chunks
            .lock()
            .iter()
            .map(|(pos, chunk)| (*pos, Arc::clone(chunk)))
            .collect()
    }

    pub fn get_block(&self, world: IVec3) -> BlockDescriptor {
        let descriptor = BlockDescriptor::new(world, BlockType::Void);
        match self.get_chunk(descriptor.chunk) {
            Some(chunk) => {
                let local = descriptor.local;
                let block = chunk.read().get_block(local.x, local.y, local.z);
                descriptor.with_block(block)
            }
            None => descriptor,
        }
    }

    /// Writes `descriptor.block` at `descriptor.world`. Writes into chunks that
    /// are not resident are dropped.
    pub fn set_block(&self, descriptor: BlockDescriptor) -> bool {
        let block = descriptor.block;
        self.update_block(descriptor.world, |_| Some(block))
    }

    /// Conditional write: `f` sees the current block and returns the
    /// replacement, or `None` to leave it alone.
    pub fn update_block<F>(&self, world: IVec3, f: F) -> bool
    where
        F: FnOnce(BlockType) -> Option<BlockType>,
    {
        if world.y < 0 || world.y >= WORLD_HEIGHT {
            return false;
        }
        let pos = ChunkPos::from_world(world);
        let Some(chunk) = self.get_chunk(pos) else {
            return false;
        };

        let local = pos.local_position(world);
        {
            let mut chunk = chunk.write();
            let current = chunk.get_block(local.x, local.y, local.z);
            match f(current) {
                Some(next) if next != current => {
                    if !chunk.set_block(local.x, local.y, local.z, next) {
                        return false;
                    }
                }
                _ => return false,
            }
        }

        self.invalidate_meshes_around(pos, local);
        true
    }

    /// Flags the owning chunk and every chunk sharing the edited boundary
    /// (sides and corners) for remeshing once they are past `Created`.
    /// A build in flight has already cleared the flag, so the edit is not
    /// lost.
    fn invalidate_meshes_around(&self, pos: ChunkPos, local: IVec3) {
        let span = |l: i32| -> &'static [i32] {
            if l == 0 {
                &[-1, 0]
            } else if l == CHUNK_SIZE - 1 {
                &[0, 1]
            } else {
                &[0]
            }
        };

        for &dx in span(local.x) {
            for &dz in span(local.z) {
                if let Some(chunk) = self.get_chunk(pos.offset(dx, dz)) {
                    let mut chunk = chunk.write();
                    if chunk.state() >= ChunkState::Decorated {
                        chunk.needs_remesh = true;
                    }
                }
            }
        }
    }

    /// Flags every chunk around `pos` for remeshing. Their border faces and
    /// corner AO sample this chunk, and terrain filled in by the generator
    /// never passes through `update_block`.
    pub fn invalidate_surrounding_meshes(&self, pos: ChunkPos) {
        let around = pos.axis_neighbors().into_iter().chain(pos.diagonal_neighbors());
        for neighbor in around {
            if let Some(chunk) = self.get_chunk(neighbor) {
                let mut chunk = chunk.write();
                if chunk.state() >= ChunkState::Decorated {
                    chunk.needs_remesh = true;
                }
            }
        }
    }

    /// Handles of the eight chunks around `pos`, cached for a mesh build.
    pub fn neighborhood(&self, pos: ChunkPos) -> Neighborhood {
        let chunks = self.chunks.lock();
        let mut around = [const { None }; 9];
        for dx in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                around[Neighborhood::slot(dx, dz)] = chunks.get(&pos.offset(dx, dz)).cloned();
            }
        }
        Neighborhood { center: pos, around }
    }
}

impl BlockAccess for ChunkStore {
    fn block_at(&self, world: IVec3) -> BlockType {
        self.get_block(world).block
    }
}

/// The chunks surrounding one chunk, resolved once so a mesh build does not
/// hit the map lock for every boundary lookup.
pub struct Neighborhood {
    center: ChunkPos,
    around: [Option<SharedChunk>; 9],
}

impl Neighborhood {
    fn slot(dx: i32, dz: i32) -> usize {
        ((dx + 1) * 3 + (dz + 1)) as usize
    }

    pub fn resident_count(&self) -> usize {
        self.around.iter().filter(|c| c.is_some()).count()
    }
}

impl BlockAccess for Neighborhood {
    fn block_at(&self, world: IVec3) -> BlockType {
        let pos = ChunkPos::from_world(world);
        let dx = pos.x - self.center.x;
        let dz = pos.z - self.center.z;
        if dx.abs() > 1 || dz.abs() > 1 || (dx == 0 && dz == 0) {
            return BlockType::Void;
        }
        match &self.around[Self::slot(dx, dz)] {
            Some(chunk) => {
                let local = pos.local_position(world);
                chunk.read().get_block(local.x, local.y, local.z)
            }
            None => BlockType::Void,
        }
    }
}
