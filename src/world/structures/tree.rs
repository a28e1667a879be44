use once_cell::sync::Lazy;

use super::Structure;
use crate::core::block::BlockType;

const TRUNK_HEIGHT: i32 = 5;
const LEAF_START: i32 = 3;
const LEAF_RADIUS: i32 = 2;

/// Oak-style tree: five-block trunk with a two-layer canopy and a leaf cap.
pub static TREE: Lazy<Structure> = Lazy::new(|| {
    let mut structure = Structure::new("Tree");

    for dy in 0..TRUNK_HEIGHT {
        structure.blocks.push((0, dy, 0, BlockType::Wood));
    }

    for dy in LEAF_START..=TRUNK_HEIGHT {
        let radius = if dy >= TRUNK_HEIGHT - 1 {
            LEAF_RADIUS - 1
        } else {
            LEAF_RADIUS
        };
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                // Skip corners for more natural shape
                if dx.abs() == radius && dz.abs() == radius {
                    continue;
                }
                if dx == 0 && dz == 0 && dy < TRUNK_HEIGHT {
                    continue;
                }
                structure.blocks.push((dx, dy, dz, BlockType::Leaves));
            }
        }
    }

    structure.with_block(0, TRUNK_HEIGHT + 1, 0, BlockType::Leaves)
});
