use glam::IVec3;
use serde::{Deserialize, Serialize};

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum BlockType {
    /// Outside of any resident chunk. Never stored in a chunk grid.
    Void,
    #[default]
    Air,
    Stone,
    Dirt,
    Grass,
    Water,
    Sand,
    Wood,
    Leaves,
}

impl BlockType {
    pub const ALL: [BlockType; 9] = [
        BlockType::Void,
        BlockType::Air,
        BlockType::Stone,
        BlockType::Dirt,
        BlockType::Grass,
        BlockType::Water,
        BlockType::Sand,
        BlockType::Wood,
        BlockType::Leaves,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_air(&self) -> bool {
        matches!(self, BlockType::Air | BlockType::Void)
    }

    /// Water and leaves are drawn in the translucent pass.
    pub fn is_translucent(&self) -> bool {
        matches!(self, BlockType::Water | BlockType::Leaves)
    }

    /// Blocks that darken the corners of neighbouring faces.
    pub fn is_solid(&self) -> bool {
        !matches!(
            self,
            BlockType::Void | BlockType::Air | BlockType::Water | BlockType::Leaves
        )
    }

    /// Whether a player may put a block into a cell holding `self`.
    pub fn is_replaceable(&self) -> bool {
        matches!(self, BlockType::Air | BlockType::Water)
    }

    pub fn should_render_face_against(&self, neighbor: BlockType) -> bool {
        match self {
            BlockType::Void | BlockType::Air => false,
            // Water hides shared faces and never draws against unloaded space
            BlockType::Water => !matches!(neighbor, BlockType::Water | BlockType::Void),
            _ => matches!(
                neighbor,
                BlockType::Air | BlockType::Water | BlockType::Leaves
            ),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Face {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

pub const FACE_NORMALS: [[i32; 3]; 6] = [
    [0, 0, 1],
    [0, 0, -1],
    [-1, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
];

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Front,
        Face::Back,
        Face::Left,
        Face::Right,
        Face::Top,
        Face::Bottom,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn normal(self) -> IVec3 {
        IVec3::from_array(FACE_NORMALS[self.index()])
    }

    pub fn from_normal(normal: IVec3) -> Option<Face> {
        Face::ALL.into_iter().find(|face| face.normal() == normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_visibility_table() {
        assert!(BlockType::Stone.should_render_face_against(BlockType::Air));
        assert!(!BlockType::Stone.should_render_face_against(BlockType::Stone));
        assert!(!BlockType::Water.should_render_face_against(BlockType::Water));
        assert!(BlockType::Water.should_render_face_against(BlockType::Air));
    }

    #[test]
    fn test_void_neighbours_hide_faces() {
        assert!(!BlockType::Stone.should_render_face_against(BlockType::Void));
        assert!(!BlockType::Water.should_render_face_against(BlockType::Void));
        assert!(BlockType::Water.should_render_face_against(BlockType::Sand));
    }

    #[test]
    fn test_solids_show_through_translucent_neighbours() {
        assert!(BlockType::Dirt.should_render_face_against(BlockType::Water));
        assert!(BlockType::Wood.should_render_face_against(BlockType::Leaves));
        assert!(BlockType::Leaves.should_render_face_against(BlockType::Leaves));
        assert!(!BlockType::Air.should_render_face_against(BlockType::Air));
    }

    #[test]
    fn test_face_normals_are_unique() {
        for face in Face::ALL {
            assert_eq!(Face::from_normal(face.normal()), Some(face));
        }
    }
}
