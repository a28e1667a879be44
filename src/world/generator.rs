//! Seeded terrain generation and the tree decoration pass.
//!
//! Terrain is a pure function of `(seed, ChunkPos)`. Decoration writes through
//! the store so trees can spill into adjacent chunks.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use glam::IVec3;

use crate::constants::*;
use crate::core::block::BlockType;
use crate::core::chunk::{Chunk, ChunkState};
use crate::core::coords::ChunkPos;
use crate::utils::settings::WorldSettings;
use crate::world::store::ChunkStore;
use crate::world::structures::TREE;

pub struct TerrainGenerator {
    noise_terrain: FastNoiseLite,
    noise_trees: FastNoiseLite,
    tree_threshold: f32,
    pub seed: u32,
}

impl TerrainGenerator {
    pub fn new(settings: &WorldSettings) -> Self {
        TerrainGenerator {
            noise_terrain: Self::create_fbm_noise(settings.seed, TERRAIN_FREQUENCY),
            noise_trees: Self::create_noise(settings.seed.wrapping_add(7), TREE_FREQUENCY),
            tree_threshold: settings.tree_threshold,
            seed: settings.seed,
        }
    }

    fn create_noise(seed: u32, frequency: f32) -> FastNoiseLite {
        let mut noise = FastNoiseLite::with_seed(seed as i32);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(frequency));
        noise
    }

    fn create_fbm_noise(seed: u32, frequency: f32) -> FastNoiseLite {
        let mut noise = FastNoiseLite::with_seed(seed as i32);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_fractal_type(Some(FractalType::FBm));
        noise.set_fractal_octaves(Some(TERRAIN_OCTAVES));
        noise.set_fractal_lacunarity(Some(2.0));
        noise.set_fractal_gain(Some(0.5));
        noise.set_frequency(Some(frequency));
        noise
    }

    /// Y of the topmost solid block in the column at `(world_x, world_z)`.
    pub fn surface_height(&self, world_x: i32, world_z: i32) -> i32 {
        let raw = self
            .noise_terrain
            .get_noise_2d(world_x as f32, world_z as f32);
        let normalized = ((raw + 1.0) * 0.5).clamp(0.0, 1.0);
        let height = TERRAIN_BASE_HEIGHT + normalized * TERRAIN_HEIGHT_RANGE;
        // Leave headroom for a tree on the highest peaks
        (height as i32).clamp(1, WORLD_HEIGHT - TREE.height() - 2)
    }

    /// Fills the chunk grid with terrain. Replaces any previous contents.
    pub fn generate_terrain(&self, chunk: &mut Chunk) {
        chunk.blocks.fill(BlockType::Air);
        let origin = chunk.origin;

        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let height = self.surface_height(origin.x + lx, origin.z + lz);
                for y in 0..=height {
                    let block = self.column_block(y, height);
                    chunk.set_block(lx, y, lz, block);
                }
                for y in (height + 1)..=SEA_LEVEL {
                    chunk.set_block(lx, y, lz, BlockType::Water);
                }
            }
        }

        chunk.generated = true;
        tracing::trace!("generated terrain for {:?}", chunk.pos);
    }

    fn column_block(&self, y: i32, surface: i32) -> BlockType {
        let depth_from_surface = surface - y;
        match depth_from_surface {
            0 if surface < SEA_LEVEL => BlockType::Sand,
            0 => BlockType::Grass,
            d if d <= SOIL_DEPTH => BlockType::Dirt,
            _ => BlockType::Stone,
        }
    }

    /// Trunk bases of every tree rooted in `pos`.
    ///
    /// Trees whose canopy would reach a diagonal chunk are dropped, so a tree
    /// only ever spills into axis neighbours.
    pub fn tree_sites(&self, pos: ChunkPos) -> Vec<IVec3> {
        let origin = pos.origin();
        let reach = TREE.reach();
        let near_edge = |l: i32| l < reach || l >= CHUNK_SIZE - reach;
        let mut sites = Vec::new();

        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                if near_edge(lx) && near_edge(lz) {
                    continue;
                }
                let world_x = origin.x + lx;
                let world_z = origin.z + lz;

                let tree_noise = self
                    .noise_trees
                    .get_noise_2d(world_x as f32, world_z as f32);
                if tree_noise <= self.tree_threshold {
                    continue;
                }
                if self.position_hash(world_x, world_z) % TREE_SPACING != 0 {
                    continue;
                }

                let height = self.surface_height(world_x, world_z);
                if matches!(self.column_block(height, height), BlockType::Grass | BlockType::Dirt) {
                    sites.push(IVec3::new(world_x, height + 1, world_z));
                }
            }
        }
        sites
    }

    /// Runs the decoration pass for `pos` and advances it to `Decorated`.
    ///
    /// Own trees are stamped into this chunk and any generated axis
    /// neighbour; trees of already decorated neighbours are stamped back into
    /// this chunk. Either order yields the same blocks.
    pub fn decorate(&self, pos: ChunkPos, store: &ChunkStore) -> bool {
        let Some(chunk) = store.get_chunk(pos) else {
            return false;
        };
        if chunk.read().state() != ChunkState::Created {
            return false;
        }

        let mut targets = vec![pos];
        let mut sources = Vec::new();
        for neighbor in pos.axis_neighbors() {
            if let Some(other) = store.get_chunk(neighbor) {
                let other = other.read();
                if other.generated {
                    targets.push(neighbor);
                }
                if other.state() >= ChunkState::Decorated {
                    sources.push(neighbor);
                }
            }
        }

        let mut trees = 0;
        for base in self.tree_sites(pos) {
            TREE.place(store, base, |p| targets.contains(&p));
            trees += 1;
        }
        for neighbor in sources {
            for base in self.tree_sites(neighbor) {
                TREE.place(store, base, |p| p == pos);
            }
        }

        let advanced = chunk.write().advance_state(ChunkState::Decorated);
        if advanced {
            store.invalidate_surrounding_meshes(pos);
            tracing::trace!("decorated {:?} with {} trees", pos, trees);
        }
        advanced
    }

    fn position_hash(&self, x: i32, z: i32) -> u32 {
        let mut hash = self.seed;
        hash = hash.wrapping_add(x as u32).wrapping_mul(73856093);
        hash = hash.wrapping_add(z as u32).wrapping_mul(19349663);
        hash ^ (hash >> 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chunk::BlockGrid;

    fn generator() -> TerrainGenerator {
        TerrainGenerator::new(&WorldSettings::default())
    }

    fn generated_store(generator: &TerrainGenerator, positions: &[ChunkPos]) -> ChunkStore {
        let store = ChunkStore::new();
        for pos in positions {
            let chunk = store.create_chunk(*pos).unwrap();
            generator.generate_terrain(&mut chunk.write());
        }
        store
    }

    fn grids(store: &ChunkStore, positions: &[ChunkPos]) -> Vec<BlockGrid> {
        positions
            .iter()
            .map(|pos| store.get_chunk(*pos).unwrap().read().blocks.clone())
            .collect()
    }

    #[test]
    fn test_terrain_is_deterministic() {
        let pos = ChunkPos::new(3, -2);
        let mut a = Chunk::new(pos);
        let mut b = Chunk::new(pos);
        generator().generate_terrain(&mut a);
        generator().generate_terrain(&mut b);

        assert!(a.generated);
        assert!(a.blocks == b.blocks);
        assert!(a.blocks.count(BlockType::Stone) > 0);

        let other = TerrainGenerator::new(&WorldSettings {
            seed: 7,
            ..WorldSettings::default()
        });
        let mut c = Chunk::new(pos);
        other.generate_terrain(&mut c);
        assert!(a.blocks != c.blocks);
    }

    #[test]
    fn test_column_layering() {
        let generator = generator();
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        generator.generate_terrain(&mut chunk);

        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let height = generator.surface_height(lx, lz);
                let top = chunk.get_block(lx, height, lz);
                if height < SEA_LEVEL {
                    assert_eq!(top, BlockType::Sand);
                    assert_eq!(chunk.get_block(lx, SEA_LEVEL, lz), BlockType::Water);
                    assert_eq!(chunk.get_block(lx, SEA_LEVEL + 1, lz), BlockType::Air);
                } else {
                    assert_eq!(top, BlockType::Grass);
                    assert_eq!(chunk.get_block(lx, height + 1, lz), BlockType::Air);
                }
                for depth in 1..=SOIL_DEPTH {
                    assert_eq!(chunk.get_block(lx, height - depth, lz), BlockType::Dirt);
                }
                assert_eq!(chunk.get_block(lx, 0, lz), BlockType::Stone);
            }
        }
    }

    #[test]
    fn test_tree_sites_stay_out_of_diagonal_chunks() {
        let generator = TerrainGenerator::new(&WorldSettings {
            tree_threshold: -1.0,
            ..WorldSettings::default()
        });

        let mut total = 0;
        for pos in ChunkPos::new(0, 0).square_around(1) {
            let sites = generator.tree_sites(pos);
            assert_eq!(sites, generator.tree_sites(pos));
            for base in &sites {
                assert_eq!(ChunkPos::from_world(*base), pos);
                for touched in TREE.footprint(*base) {
                    assert!(touched == pos || pos.axis_neighbors().contains(&touched));
                }
            }
            total += sites.len();
        }
        assert!(total > 0);
    }

    #[test]
    fn test_tree_field_is_coarser_than_terrain() {
        let generator = generator();
        let roughness = |noise: &FastNoiseLite| -> f32 {
            (0..512)
                .map(|x| {
                    let a = noise.get_noise_2d(x as f32, 37.0);
                    let b = noise.get_noise_2d(x as f32 + 1.0, 37.0);
                    (a - b).abs()
                })
                .sum()
        };
        assert!(roughness(&generator.noise_trees) < roughness(&generator.noise_terrain));

        // Default threshold still grows forest patches somewhere nearby
        let total: usize = ChunkPos::new(0, 0)
            .square_around(16)
            .into_iter()
            .map(|pos| generator.tree_sites(pos).len())
            .sum();
        assert!(total > 0);
    }

    #[test]
    fn test_decoration_is_order_independent() {
        let generator = TerrainGenerator::new(&WorldSettings {
            tree_threshold: -1.0,
            ..WorldSettings::default()
        });
        let row = [ChunkPos::new(-1, 0), ChunkPos::new(0, 0), ChunkPos::new(1, 0)];

        let forward = generated_store(&generator, &row);
        for pos in row {
            assert!(generator.decorate(pos, &forward));
        }

        let reverse = generated_store(&generator, &row);
        for pos in row.iter().rev() {
            assert!(generator.decorate(*pos, &reverse));
        }

        assert!(grids(&forward, &row) == grids(&reverse, &row));
        assert!(grids(&forward, &row).iter().any(|g| g.count(BlockType::Wood) > 0));
        assert_eq!(forward.chunk_state(row[1]), Some(ChunkState::Decorated));
        assert!(!generator.decorate(row[1], &forward));
    }

    #[test]
    fn test_late_neighbour_pulls_spill() {
        let generator = TerrainGenerator::new(&WorldSettings {
            tree_threshold: -1.0,
            ..WorldSettings::default()
        });
        let (a, b) = (ChunkPos::new(0, 0), ChunkPos::new(1, 0));

        // `b` does not exist while `a` is decorated
        let store = generated_store(&generator, &[a]);
        generator.decorate(a, &store);
        let chunk = store.create_chunk(b).unwrap();
        generator.generate_terrain(&mut chunk.write());
        generator.decorate(b, &store);

        let both = generated_store(&generator, &[a, b]);
        generator.decorate(a, &both);
        generator.decorate(b, &both);

        assert!(grids(&store, &[a, b]) == grids(&both, &[a, b]));
    }
}
