use glam::IVec3;

use crate::core::block::BlockType;
use crate::core::coords::ChunkPos;
use crate::world::store::ChunkStore;

/// Block template stamped relative to a base position.
#[derive(Debug, Clone)]
pub struct Structure {
    pub name: String,
    pub blocks: Vec<(i32, i32, i32, BlockType)>,
}

impl Structure {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn with_block(mut self, x: i32, y: i32, z: i32, block: BlockType) -> Self {
        self.blocks.push((x, y, z, block));
        self
    }

    /// Largest horizontal offset of any block from the base.
    pub fn reach(&self) -> i32 {
        self.blocks
            .iter()
            .map(|(x, _, z, _)| x.abs().max(z.abs()))
            .max()
            .unwrap_or(0)
    }

    pub fn height(&self) -> i32 {
        self.blocks.iter().map(|(_, y, _, _)| y + 1).max().unwrap_or(0)
    }

    /// Chunks touched when stamped at `base`.
    pub fn footprint(&self, base: IVec3) -> Vec<ChunkPos> {
        let mut chunks: Vec<ChunkPos> = self
            .blocks
            .iter()
            .map(|(x, y, z, _)| ChunkPos::from_world(base + IVec3::new(*x, *y, *z)))
            .collect();
        chunks.sort_by_key(|p| (p.x, p.z));
        chunks.dedup();
        chunks
    }

    /// Stamps the template at `base` through the store, writing only into
    /// chunks accepted by `target`. Returns how many blocks changed.
    ///
    /// Wood overwrites air and leaves, leaves only fill air, so stamping
    /// overlapping templates gives the same result in any order.
    pub fn place<F>(&self, store: &ChunkStore, base: IVec3, target: F) -> usize
    where
        F: Fn(ChunkPos) -> bool,
    {
        let mut written = 0;
        for &(x, y, z, block) in &self.blocks {
            let world = base + IVec3::new(x, y, z);
            if !target(ChunkPos::from_world(world)) {
                continue;
            }
            let placed = store.update_block(world, |current| {
                stamp_replaces(block, current).then_some(block)
            });
            if placed {
                written += 1;
            }
        }
        written
    }
}

fn stamp_replaces(placing: BlockType, current: BlockType) -> bool {
    match placing {
        BlockType::Wood => matches!(current, BlockType::Air | BlockType::Leaves),
        _ => current == BlockType::Air,
    }
}
