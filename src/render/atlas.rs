use crate::constants::ATLAS_TILES_PER_ROW;
use crate::core::block::{BlockType, Face};

/// Atlas tile `(column, row)` per block type, indexed by `Face`.
/// Order: Front, Back, Left, Right, Top, Bottom.
static BLOCK_TILES: [[(u32, u32); 6]; 9] = [
    // Void
    [(0, 15); 6],
    // Air
    [(0, 15); 6],
    // Stone
    [(1, 0); 6],
    // Dirt
    [(2, 0); 6],
    // Grass
    [(3, 0), (3, 0), (3, 0), (3, 0), (0, 0), (2, 0)],
    // Water
    [(14, 0); 6],
    // Sand
    [(2, 1); 6],
    // Wood
    [(4, 1), (4, 1), (4, 1), (4, 1), (5, 1), (5, 1)],
    // Leaves
    [(4, 3); 6],
];

/// Grid layout of the block texture atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasLayout {
    pub tiles_per_row: u32,
}

impl Default for AtlasLayout {
    fn default() -> Self {
        AtlasLayout {
            tiles_per_row: ATLAS_TILES_PER_ROW,
        }
    }
}

impl AtlasLayout {
    pub fn tile(&self, block: BlockType, face: Face) -> (u32, u32) {
        BLOCK_TILES[block.index()][face.index()]
    }

    /// UVs for the four face corners in quad order
    /// (bottom-left, bottom-right, top-right, top-left).
    pub fn tile_uv(&self, block: BlockType, face: Face) -> [[f32; 2]; 4] {
        let (col, row) = self.tile(block, face);
        let step = 1.0 / self.tiles_per_row as f32;
        let u0 = col as f32 * step;
        let v0 = row as f32 * step;
        let u1 = u0 + step;
        let v1 = v0 + step;
        [[u0, v1], [u1, v1], [u1, v0], [u0, v0]]
    }
}
