use glam::{IVec3, Vec3};

use crate::constants::*;
use crate::core::block::BlockType;
use crate::core::coords::ChunkPos;
use crate::render::frustum::AABB;
use crate::render::mesh::ChunkMesh;

/// Lifecycle of a chunk. Only ever moves forward.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ChunkState {
    Created,
    Decorated,
    Meshed,
    Ready,
    Loaded,
}

impl ChunkState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: ChunkState) -> bool {
        if next <= self {
            return false;
        }
        match self {
            ChunkState::Created => next == ChunkState::Decorated,
            _ => next != ChunkState::Loaded || self == ChunkState::Ready,
        }
    }
}

/// Flat `CHUNK_SIZE x WORLD_HEIGHT x CHUNK_SIZE` block arena.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockGrid {
    blocks: Box<[BlockType]>,
}

impl BlockGrid {
    pub fn new() -> Self {
        BlockGrid {
            blocks: vec![BlockType::Air; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    #[inline]
    fn index(x: i32, y: i32, z: i32) -> Option<usize> {
        if x >= 0 && x < CHUNK_SIZE && y >= 0 && y < WORLD_HEIGHT && z >= 0 && z < CHUNK_SIZE {
            Some(((y * CHUNK_SIZE + z) * CHUNK_SIZE + x) as usize)
        } else {
            None
        }
    }

    /// Out-of-range reads return `Void` beside or below the grid and `Air`
    /// above it.
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockType {
        match Self::index(x, y, z) {
            Some(i) => self.blocks[i],
            None if y >= WORLD_HEIGHT
                && (0..CHUNK_SIZE).contains(&x)
                && (0..CHUNK_SIZE).contains(&z) =>
            {
                BlockType::Air
            }
            None => BlockType::Void,
        }
    }

    pub fn set(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        if block == BlockType::Void {
            return false;
        }
        match Self::index(x, y, z) {
            Some(i) => {
                self.blocks[i] = block;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, block: BlockType) {
        self.blocks.fill(block);
    }

    pub fn count(&self, block: BlockType) -> usize {
        self.blocks.iter().filter(|b| **b == block).count()
    }

    pub fn as_slice(&self) -> &[BlockType] {
        &self.blocks
    }
}

impl Default for BlockGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlockGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockGrid")
            .field("non_air", &(CHUNK_VOLUME - self.count(BlockType::Air)))
            .finish()
    }
}

pub struct Chunk {
    pub pos: ChunkPos,
    pub origin: IVec3,
    pub blocks: BlockGrid,
    pub aabb: AABB,
    pub mesh: ChunkMesh,
    /// Terrain has been written into `blocks`.
    pub generated: bool,
    /// Set when a block edit invalidated an existing mesh.
    pub needs_remesh: bool,
    pub mesh_version: u64,
    pub uploaded_version: u64,
    state: ChunkState,
}

impl Chunk {
    pub fn new(pos: ChunkPos) -> Self {
        let origin = pos.origin();
        let min = origin.as_vec3();
        Chunk {
            pos,
            origin,
            blocks: BlockGrid::new(),
            aabb: AABB::new(
                min,
                min + Vec3::new(CHUNK_SIZE as f32, WORLD_HEIGHT as f32, CHUNK_SIZE as f32),
            ),
            mesh: ChunkMesh::default(),
            generated: false,
            needs_remesh: false,
            mesh_version: 0,
            uploaded_version: 0,
            state: ChunkState::Created,
        }
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Moves the chunk to `next` if that is a forward, non-skipping step.
    pub fn advance_state(&mut self, next: ChunkState) -> bool {
        if self.state.can_advance_to(next) {
            tracing::trace!("chunk {:?}: {:?} -> {:?}", self.pos, self.state, next);
            self.state = next;
            true
        } else {
            if next > self.state {
                tracing::debug!(
                    "chunk {:?}: refused transition {:?} -> {:?}",
                    self.pos,
                    self.state,
                    next
                );
            }
            false
        }
    }

    pub fn has_mesh(&self) -> bool {
        self.state >= ChunkState::Meshed
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        self.blocks.get(x, y, z)
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        self.blocks.set(x, y, z, block)
    }

    pub fn get_block_world(&self, world: IVec3) -> BlockType {
        let local = world - self.origin;
        self.blocks.get(local.x, local.y, local.z)
    }

    pub fn install_mesh(&mut self, mesh: ChunkMesh) {
        self.mesh = mesh;
        self.mesh_version += 1;
        self.advance_state(ChunkState::Meshed);
    }

    pub fn needs_upload(&self) -> bool {
        self.state >= ChunkState::Ready && self.mesh_version > self.uploaded_version
    }

    pub fn mark_uploaded(&mut self) {
        self.uploaded_version = self.mesh_version;
        self.advance_state(ChunkState::Loaded);
    }
}
