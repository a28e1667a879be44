//! World-space to chunk-space conversions.
//!
//! Every other module goes through these helpers, so floor division for
//! negative coordinates lives in exactly one place.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::CHUNK_SIZE;

/// Column of the world identified by its chunk grid coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkPos { x, z }
    }

    /// Chunk holding the block at `world`.
    pub fn from_world(world: IVec3) -> Self {
        ChunkPos {
            x: world.x.div_euclid(CHUNK_SIZE),
            z: world.z.div_euclid(CHUNK_SIZE),
        }
    }

    /// Chunk under a free-floating position such as the camera.
    pub fn from_world_f32(position: Vec3) -> Self {
        ChunkPos {
            x: (position.x / CHUNK_SIZE as f32).floor() as i32,
            z: (position.z / CHUNK_SIZE as f32).floor() as i32,
        }
    }

    pub fn origin(&self) -> IVec3 {
        IVec3::new(self.x * CHUNK_SIZE, 0, self.z * CHUNK_SIZE)
    }

    pub fn local_position(&self, world: IVec3) -> IVec3 {
        world - self.origin()
    }

    /// Horizontal center of the chunk in world units.
    pub fn center(&self) -> Vec3 {
        let half = CHUNK_SIZE as f32 * 0.5;
        Vec3::new(
            (self.x * CHUNK_SIZE) as f32 + half,
            0.0,
            (self.z * CHUNK_SIZE) as f32 + half,
        )
    }

    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        ChunkPos::new(self.x + dx, self.z + dz)
    }

    /// Distance on the chunk grid where the 3x3 square around a chunk is one.
    pub fn chebyshev_distance(&self, other: ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    pub fn axis_neighbors(&self) -> [ChunkPos; 4] {
        [
            self.offset(0, 1),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(-1, 0),
        ]
    }

    pub fn diagonal_neighbors(&self) -> [ChunkPos; 4] {
        [
            self.offset(1, 1),
            self.offset(1, -1),
            self.offset(-1, -1),
            self.offset(-1, 1),
        ]
    }

    /// All coordinates within `radius` of `self`, nearest first.
    pub fn square_around(&self, radius: i32) -> Vec<ChunkPos> {
        let side = (2 * radius + 1).max(0) as usize;
        let mut out = Vec::with_capacity(side * side);
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                out.push(self.offset(dx, dz));
            }
        }
        out.sort_by_key(|pos| {
            let dx = pos.x - self.x;
            let dz = pos.z - self.z;
            dx * dx + dz * dz
        });
        out
    }
}
