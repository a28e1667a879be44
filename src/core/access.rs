use glam::IVec3;

use crate::core::block::BlockType;

/// Read access to blocks by world position, used wherever a lookup may
/// cross a chunk boundary. Non-resident positions read as `Void`.
pub trait BlockAccess {
    fn block_at(&self, world: IVec3) -> BlockType;
}

impl<F> BlockAccess for F
where
    F: Fn(IVec3) -> BlockType,
{
    fn block_at(&self, world: IVec3) -> BlockType {
        self(world)
    }
}
