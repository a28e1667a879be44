//! Face-culling mesh builder with per-vertex ambient occlusion.
//!
//! Works on a snapshot of the chunk grid; any lookup that leaves the chunk
//! goes through the caller supplied `BlockAccess`.

use glam::IVec3;

use crate::constants::*;
use crate::core::access::BlockAccess;
use crate::core::block::{BlockType, FACE_NORMALS, Face};
use crate::core::chunk::BlockGrid;
use crate::render::atlas::AtlasLayout;
use crate::render::mesh::{ChunkMesh, add_quad};

/// Unit-cube corners of each face, counter-clockwise seen from outside,
/// starting bottom-left.
pub const FACE_CORNERS: [[[i32; 3]; 4]; 6] = [
    // Front (+Z)
    [[0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]],
    // Back (-Z)
    [[1, 0, 0], [0, 0, 0], [0, 1, 0], [1, 1, 0]],
    // Left (-X)
    [[0, 0, 0], [0, 0, 1], [0, 1, 1], [0, 1, 0]],
    // Right (+X)
    [[1, 0, 1], [1, 0, 0], [1, 1, 0], [1, 1, 1]],
    // Top (+Y)
    [[0, 1, 1], [1, 1, 1], [1, 1, 0], [0, 1, 0]],
    // Bottom (-Y)
    [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
];

/// Per `(face, vertex)`: offsets of the two edge neighbours and the corner
/// neighbour, all in the layer in front of the face.
pub static AO_NEIGHBORS: [[[[i32; 3]; 3]; 4]; 6] = build_ao_neighbors();

const fn build_ao_neighbors() -> [[[[i32; 3]; 3]; 4]; 6] {
    let mut table = [[[[0; 3]; 3]; 4]; 6];
    let mut face = 0;
    while face < 6 {
        let normal = FACE_NORMALS[face];
        let mut vertex = 0;
        while vertex < 4 {
            let corner = FACE_CORNERS[face][vertex];

            // The two in-plane axes and which way this corner leans on each
            let mut axes = [0usize; 2];
            let mut found = 0;
            let mut axis = 0;
            while axis < 3 {
                if normal[axis] == 0 {
                    axes[found] = axis;
                    found += 1;
                }
                axis += 1;
            }

            let mut side_a = normal;
            let mut side_b = normal;
            let mut diagonal = normal;
            let sign_a = if corner[axes[0]] == 1 { 1 } else { -1 };
            let sign_b = if corner[axes[1]] == 1 { 1 } else { -1 };
            side_a[axes[0]] += sign_a;
            side_b[axes[1]] += sign_b;
            diagonal[axes[0]] += sign_a;
            diagonal[axes[1]] += sign_b;

            table[face][vertex][0] = side_a;
            table[face][vertex][1] = side_b;
            table[face][vertex][2] = diagonal;
            vertex += 1;
        }
        face += 1;
    }
    table
}

/// AO level for one vertex: 0 is fully occluded, 3 is open.
pub fn vertex_ao(side_a: bool, side_b: bool, corner: bool) -> u8 {
    if side_a && side_b {
        return 0;
    }
    3 - (side_a as u8 + side_b as u8 + corner as u8)
}

struct ChunkView<'a, W: BlockAccess + ?Sized> {
    origin: IVec3,
    grid: &'a BlockGrid,
    world: &'a W,
}

impl<W: BlockAccess + ?Sized> ChunkView<'_, W> {
    #[inline]
    fn block(&self, world_pos: IVec3) -> BlockType {
        let local = world_pos - self.origin;
        if local.x >= 0 && local.x < CHUNK_SIZE && local.z >= 0 && local.z < CHUNK_SIZE {
            self.grid.get(local.x, local.y, local.z)
        } else {
            self.world.block_at(world_pos)
        }
    }
}

/// Builds opaque and translucent geometry for the chunk whose grid starts at
/// `origin`.
pub fn build_chunk_mesh<W: BlockAccess + ?Sized>(
    origin: IVec3,
    grid: &BlockGrid,
    world: &W,
    atlas: &AtlasLayout,
) -> ChunkMesh {
    let view = ChunkView {
        origin,
        grid,
        world,
    };
    let mut mesh = ChunkMesh::default();

    for y in 0..WORLD_HEIGHT {
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let block = grid.get(x, y, z);
                if block.is_air() {
                    continue;
                }

                let world_pos = origin + IVec3::new(x, y, z);
                let target = if block.is_translucent() {
                    &mut mesh.translucent
                } else {
                    &mut mesh.opaque
                };

                let mut visible = false;
                for face in Face::ALL {
                    let neighbor = view.block(world_pos + face.normal());
                    if !block.should_render_face_against(neighbor) {
                        continue;
                    }

                    let f = face.index();
                    let mut corners = [[0.0f32; 3]; 4];
                    let mut ao = [3u8; 4];
                    for v in 0..4 {
                        let c = FACE_CORNERS[f][v];
                        corners[v] = [
                            (world_pos.x + c[0]) as f32,
                            (world_pos.y + c[1]) as f32,
                            (world_pos.z + c[2]) as f32,
                        ];
                        let [a, b, d] = AO_NEIGHBORS[f][v];
                        ao[v] = vertex_ao(
                            view.block(world_pos + IVec3::from_array(a)).is_solid(),
                            view.block(world_pos + IVec3::from_array(b)).is_solid(),
                            view.block(world_pos + IVec3::from_array(d)).is_solid(),
                        );
                    }

                    let normal = face.normal().as_vec3().to_array();
                    add_quad(target, corners, atlas.tile_uv(block, face), normal, ao);
                    visible = true;
                }

                if visible {
                    mesh.visible_blocks.push(world_pos);
                }
            }
        }
    }

    mesh
}
