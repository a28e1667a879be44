use glam::{IVec3, Vec3};

use crate::constants::CHUNK_SIZE;
use crate::core::block::BlockType;
use crate::core::coords::ChunkPos;
use crate::render::frustum::AABB;
use crate::world::store::{BlockDescriptor, ChunkStore};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockHit {
    pub block: BlockDescriptor,
    pub distance: f32,
    /// Normal of the face the ray entered through.
    pub normal: IVec3,
}

impl BlockHit {
    /// Cell in front of the hit face, where a placed block goes.
    pub fn adjacent(&self) -> IVec3 {
        self.block.world + self.normal
    }
}

/// Closest targetable block along the ray, searched among the visible blocks
/// of meshed chunks. Air and water cannot be targeted.
pub fn pick_block(
    store: &ChunkStore,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<BlockHit> {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }

    let home = ChunkPos::from_world_f32(origin);
    let chunk_range = (max_distance / CHUNK_SIZE as f32).ceil() as i32;
    let mut best: Option<BlockHit> = None;

    for pos in home.square_around(chunk_range) {
        let Some(chunk) = store.get_chunk(pos) else {
            continue;
        };
        let chunk = chunk.read();
        if !chunk.has_mesh() {
            continue;
        }

        for &world in &chunk.mesh.visible_blocks {
            let block = chunk.get_block_world(world);
            if matches!(block, BlockType::Air | BlockType::Water) {
                continue;
            }

            let min = world.as_vec3();
            let Some((distance, normal)) =
                AABB::new(min, min + Vec3::ONE).ray_intersection(origin, direction)
            else {
                continue;
            };

            let closest = best.map_or(max_distance, |hit| hit.distance);
            if distance < closest {
                best = Some(BlockHit {
                    block: BlockDescriptor::new(world, block),
                    distance,
                    normal: normal.as_ivec3(),
                });
            }
        }
    }

    best
}
