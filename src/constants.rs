// World constants
pub const CHUNK_SIZE: i32 = 16;
pub const WORLD_HEIGHT: i32 = CHUNK_SIZE * CHUNK_SIZE;
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE * WORLD_HEIGHT * CHUNK_SIZE) as usize;
pub const SEA_LEVEL: i32 = 48;
pub const DEFAULT_VIEW_DISTANCE: i32 = 4;
pub const DEFAULT_SEED: u32 = 1234567890;

// Terrain shaping
pub const TERRAIN_BASE_HEIGHT: f32 = 32.0;
pub const TERRAIN_HEIGHT_RANGE: f32 = 48.0;
pub const TERRAIN_FREQUENCY: f32 = 0.01;
pub const TERRAIN_OCTAVES: i32 = 4;
pub const SOIL_DEPTH: i32 = 3;

// Decoration
pub const TREE_FREQUENCY: f32 = 0.005;
pub const DEFAULT_TREE_THRESHOLD: f32 = 0.1;
pub const TREE_SPACING: u32 = 12;

// Atlas layout (tiles per row of the block texture atlas)
pub const ATLAS_TILES_PER_ROW: u32 = 16;

// Picking
pub const PICK_DISTANCE: f32 = CHUNK_SIZE as f32;
