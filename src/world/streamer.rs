//! View-distance streaming: keeps the chunks around the camera resident,
//! drives them through generation, decoration and meshing, and hands
//! finished geometry to the uploader.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{IVec3, Vec3, Vec4};
use rustc_hash::FxHashMap;

use crate::constants::PICK_DISTANCE;
use crate::core::block::BlockType;
use crate::core::chunk::ChunkState;
use crate::core::coords::ChunkPos;
use crate::error::EngineError;
use crate::render::upload::MeshUploader;
use crate::utils::settings::{EngineSettings, GenerationMode, StreamingSettings};
use crate::world::generator::TerrainGenerator;
use crate::world::picking::{BlockHit, pick_block};
use crate::world::store::{ChunkStore, SharedChunk};
use crate::world::worker::{JobHandle, JobKind, JobOutcome, JobStatus, MeshWorker};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StreamStats {
    pub resident: usize,
    pub loaded: usize,
    pub pending_jobs: usize,
    pub meshes_built: u64,
    pub uploads: u64,
    pub evicted: u64,
    pub last_tick: Duration,
    pub last_mesh_time: Duration,
}

/// Loaded chunks in draw order: opaque front-to-back, translucent
/// back-to-front.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    pub opaque: Vec<ChunkPos>,
    pub translucent: Vec<ChunkPos>,
}

pub struct ChunkStreamer<U: MeshUploader> {
    store: Arc<ChunkStore>,
    generator: TerrainGenerator,
    worker: MeshWorker,
    uploader: U,
    settings: StreamingSettings,
    log_job_timings: bool,
    /// At most one outstanding job per chunk.
    pending: FxHashMap<ChunkPos, JobHandle>,
    center: Option<ChunkPos>,
    stats: StreamStats,
}

impl<U: MeshUploader> ChunkStreamer<U> {
    pub fn new(settings: &EngineSettings, uploader: U) -> Result<Self, EngineError> {
        let store = Arc::new(ChunkStore::new());
        let worker = MeshWorker::spawn(Arc::clone(&store), &settings.world)?;
        let mut streaming = settings.streaming.clone();
        streaming.view_distance = streaming.view_distance.max(0);

        tracing::info!(
            "streaming seed {} at view distance {} ({:?} generation)",
            settings.world.seed,
            streaming.view_distance,
            streaming.generation
        );

        Ok(ChunkStreamer {
            store,
            generator: TerrainGenerator::new(&settings.world),
            worker,
            uploader,
            settings: streaming,
            log_job_timings: settings.debug.log_job_timings,
            pending: FxHashMap::default(),
            center: None,
            stats: StreamStats::default(),
        })
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn view_distance(&self) -> i32 {
        self.settings.view_distance
    }

    pub fn set_view_distance(&mut self, view_distance: i32) {
        self.settings.view_distance = view_distance.max(0);
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn tick(&mut self, camera: Vec3) {
        let start = Instant::now();
        let center = ChunkPos::from_world_f32(camera);
        if self.center != Some(center) {
            tracing::debug!("camera entered chunk {:?}", center);
        }
        self.center = Some(center);

        self.collect_finished();
        self.evict_far(center);
        self.create_missing(center);
        self.advance_created();
        self.schedule_meshes(center);
        self.upload_ready();

        self.stats.last_tick = start.elapsed();
        self.refresh_stats();
    }

    /// Blocks until every job, including the follow-up jobs they enable, has
    /// finished, then uploads the results.
    pub fn drain_jobs(&mut self) {
        while !self.pending.is_empty() {
            let handles: Vec<JobHandle> = self.pending.drain().map(|(_, h)| h).collect();
            for handle in handles {
                let outcome = handle.wait();
                self.record(outcome);
            }
            if let Some(center) = self.center {
                self.advance_created();
                self.schedule_meshes(center);
            }
        }
        self.upload_ready();
        self.refresh_stats();
    }

    fn collect_finished(&mut self) {
        let mut finished = Vec::new();
        for (pos, handle) in &self.pending {
            if let Some(outcome) = handle.try_complete() {
                finished.push((*pos, outcome));
            }
        }
        for (pos, outcome) in finished {
            self.pending.remove(&pos);
            self.record(outcome);
        }
    }

    fn record(&mut self, outcome: JobOutcome) {
        match outcome.status {
            JobStatus::Completed => {
                if outcome.kind == JobKind::Mesh {
                    self.stats.meshes_built += 1;
                    self.stats.last_mesh_time = outcome.elapsed;
                }
                if self.log_job_timings {
                    tracing::info!(
                        "{:?} {:?} took {:?}",
                        outcome.kind,
                        outcome.pos,
                        outcome.elapsed
                    );
                }
            }
            JobStatus::Stale | JobStatus::Cancelled => {
                tracing::debug!(
                    "{:?} job for {:?} dropped: {:?}",
                    outcome.kind,
                    outcome.pos,
                    outcome.status
                );
            }
        }
    }

    fn evict_far(&mut self, center: ChunkPos) {
        let keep = self.settings.view_distance + 1;
        for pos in self.store.positions() {
            if pos.chebyshev_distance(center) <= keep {
                continue;
            }
            self.store.destroy_chunk(pos);
            // A running job sees the chunk is gone and reports Stale
            self.pending.remove(&pos);
            self.uploader.release(pos);
            self.stats.evicted += 1;
            tracing::trace!("evicted chunk {:?}", pos);
        }
    }

    fn create_missing(&mut self, center: ChunkPos) {
        let mut created = 0;
        for pos in center.square_around(self.settings.view_distance) {
            let ring = pos.axis_neighbors();
            for target in std::iter::once(pos).chain(ring) {
                let Some(chunk) = self.store.create_chunk(target) else {
                    continue;
                };
                created += 1;
                match self.settings.generation {
                    GenerationMode::Inline => {
                        self.generator.generate_terrain(&mut chunk.write());
                    }
                    GenerationMode::Background => {
                        self.submit(JobKind::Generate, target, chunk);
                    }
                }
            }
        }
        if created > 0 {
            tracing::debug!("created {} chunks around {:?}", created, center);
        }
    }

    /// Decorates generated chunks still in `Created`.
    fn advance_created(&mut self) {
        let mut created: Vec<(ChunkPos, SharedChunk)> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|(_, chunk)| {
                let chunk = chunk.read();
                chunk.state() == ChunkState::Created && chunk.generated
            })
            .collect();
        created.sort_by_key(|(pos, _)| (pos.x, pos.z));

        for (pos, chunk) in created {
            match self.settings.generation {
                GenerationMode::Inline => {
                    self.generator.decorate(pos, &self.store);
                }
                GenerationMode::Background => {
                    if !self.pending.contains_key(&pos) {
                        self.submit(JobKind::Decorate, pos, chunk);
                    }
                }
            }
        }
    }

    fn schedule_meshes(&mut self, center: ChunkPos) {
        for pos in center.square_around(self.settings.view_distance) {
            if self.pending.contains_key(&pos) {
                continue;
            }
            let Some(chunk) = self.store.get_chunk(pos) else {
                continue;
            };
            let state = chunk.read().state();
            if state == ChunkState::Decorated && self.neighbors_decorated(pos) {
                self.submit(JobKind::Mesh, pos, chunk);
            }
        }

        // Edited chunks, including ones that have left the view square
        for (pos, chunk) in self.store.snapshot() {
            if self.pending.contains_key(&pos) {
                continue;
            }
            let remesh = {
                let chunk = chunk.read();
                chunk.state() >= ChunkState::Ready && chunk.needs_remesh
            };
            if remesh {
                self.submit(JobKind::Mesh, pos, chunk);
            }
        }
    }

    fn neighbors_decorated(&self, pos: ChunkPos) -> bool {
        pos.axis_neighbors().iter().all(|n| {
            self.store
                .chunk_state(*n)
                .is_some_and(|state| state >= ChunkState::Decorated)
        })
    }

    fn submit(&mut self, kind: JobKind, pos: ChunkPos, chunk: SharedChunk) {
        let handle = self.worker.submit(kind, pos, chunk);
        self.pending.insert(pos, handle);
    }

    fn upload_ready(&mut self) {
        let mut ready: Vec<(ChunkPos, SharedChunk)> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|(_, chunk)| chunk.read().needs_upload())
            .collect();
        ready.sort_by_key(|(pos, _)| (pos.x, pos.z));

        for (pos, chunk) in ready {
            let mut chunk = chunk.write();
            self.uploader.upload(pos, &chunk.mesh);
            chunk.mark_uploaded();
            self.stats.uploads += 1;
        }
    }

    fn refresh_stats(&mut self) {
        let snapshot = self.store.snapshot();
        self.stats.resident = snapshot.len();
        self.stats.loaded = snapshot
            .iter()
            .filter(|(_, chunk)| chunk.read().state() == ChunkState::Loaded)
            .count();
        self.stats.pending_jobs = self.pending.len();
    }

    /// Replaces the targeted block with air. Air, water and unloaded space
    /// cannot be broken.
    pub fn break_block(&mut self, world: IVec3) -> bool {
        let current = self.store.get_block(world);
        if matches!(
            current.block,
            BlockType::Void | BlockType::Air | BlockType::Water
        ) {
            return false;
        }
        self.store.set_block(current.with_block(BlockType::Air))
    }

    /// Puts `block` at `world` if that cell holds air or water.
    pub fn place_block(&mut self, world: IVec3, block: BlockType) -> bool {
        if block.is_air() {
            return false;
        }
        self.store.update_block(world, |current| {
            current.is_replaceable().then_some(block)
        })
    }

    pub fn pick_block(&self, origin: Vec3, direction: Vec3) -> Option<BlockHit> {
        pick_block(&self.store, origin, direction, PICK_DISTANCE)
    }

    /// Loaded chunks sorted for drawing, optionally culled against frustum
    /// planes.
    pub fn draw_list(&self, camera: Vec3, frustum: Option<&[Vec4; 6]>) -> DrawList {
        let mut opaque = Vec::new();
        let mut translucent = Vec::new();

        for (pos, chunk) in self.store.snapshot() {
            let chunk = chunk.read();
            if chunk.state() != ChunkState::Loaded {
                continue;
            }
            if let Some(planes) = frustum {
                if !chunk.aabb.is_visible(planes) {
                    continue;
                }
            }

            let distance = camera.distance_squared(chunk.aabb.center());
            if !chunk.mesh.opaque.is_empty() {
                opaque.push((distance, pos));
            }
            if !chunk.mesh.translucent.is_empty() {
                translucent.push((distance, pos));
            }
        }

        opaque.sort_by(|a, b| a.0.total_cmp(&b.0));
        translucent.sort_by(|a, b| b.0.total_cmp(&a.0));

        DrawList {
            opaque: opaque.into_iter().map(|(_, pos)| pos).collect(),
            translucent: translucent.into_iter().map(|(_, pos)| pos).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::render::atlas::AtlasLayout;
    use crate::render::frustum::extract_frustum_planes;
    use crate::render::mesher::build_chunk_mesh;
    use crate::render::upload::HeadlessUploader;
    use glam::Mat4;

    fn settings(view_distance: i32, generation: GenerationMode) -> EngineSettings {
        let mut settings = EngineSettings::default();
        settings.world.seed = 1234567890;
        settings.streaming.view_distance = view_distance;
        settings.streaming.generation = generation;
        settings
    }

    fn streamer(view_distance: i32, generation: GenerationMode) -> ChunkStreamer<HeadlessUploader> {
        ChunkStreamer::new(&settings(view_distance, generation), HeadlessUploader::new()).unwrap()
    }

    fn assert_view_loaded(streamer: &ChunkStreamer<HeadlessUploader>, center: ChunkPos) {
        let store = streamer.store();
        for pos in center.square_around(streamer.view_distance()) {
            assert_eq!(store.chunk_state(pos), Some(ChunkState::Loaded), "{:?}", pos);
        }
    }

    /// Highest block in a column that is neither air nor water.
    fn surface(store: &ChunkStore, x: i32, z: i32) -> IVec3 {
        (0..WORLD_HEIGHT)
            .rev()
            .map(|y| IVec3::new(x, y, z))
            .find(|p| {
                let block = store.get_block(*p).block;
                !block.is_air() && block != BlockType::Water
            })
            .expect("column has terrain")
    }

    #[test]
    fn test_first_tick_loads_view_square() {
        let mut streamer = streamer(1, GenerationMode::Inline);
        streamer.tick(Vec3::ZERO);
        streamer.drain_jobs();

        let stats = streamer.stats();
        assert_eq!(stats.loaded, 9);
        // View square plus the twelve axis-neighbour border chunks
        assert_eq!(stats.resident, 21);
        assert_eq!(stats.pending_jobs, 0);
        assert_eq!(stats.meshes_built, 9);
        assert_view_loaded(&streamer, ChunkPos::new(0, 0));
        assert_eq!(
            streamer.store().chunk_state(ChunkPos::new(2, 0)),
            Some(ChunkState::Decorated)
        );
        assert!(!streamer.store().chunk_exists(ChunkPos::new(2, 2)));
        assert_eq!(streamer.uploader().buffers.len(), 9);
    }

    #[test]
    fn test_background_generation_reaches_same_world() {
        let mut inline = streamer(1, GenerationMode::Inline);
        let mut background = streamer(1, GenerationMode::Background);
        for s in [&mut inline, &mut background] {
            s.tick(Vec3::ZERO);
            s.drain_jobs();
        }

        assert_view_loaded(&background, ChunkPos::new(0, 0));
        assert_eq!(background.stats().loaded, 9);
        for pos in ChunkPos::new(0, 0).square_around(1) {
            let a = inline.store().get_chunk(pos).unwrap();
            let b = background.store().get_chunk(pos).unwrap();
            assert!(a.read().blocks == b.read().blocks, "{:?}", pos);
        }
    }

    #[test]
    fn test_moving_camera_evicts_far_chunks() {
        let mut streamer = streamer(1, GenerationMode::Inline);
        streamer.tick(Vec3::ZERO);
        streamer.drain_jobs();
        let sample = IVec3::new(-10, 10, 3);
        assert_ne!(streamer.store().get_block(sample).block, BlockType::Void);

        let camera = Vec3::new(5.0 * CHUNK_SIZE as f32 + 1.0, 80.0, 1.0);
        streamer.tick(camera);
        streamer.drain_jobs();

        assert_eq!(streamer.store().get_block(sample).block, BlockType::Void);
        assert!(!streamer.store().chunk_exists(ChunkPos::new(-1, 0)));
        assert!(streamer.uploader().releases > 0);
        assert!(!streamer.uploader().buffers.contains_key(&ChunkPos::new(0, 0)));
        assert_view_loaded(&streamer, ChunkPos::new(5, 0));
        assert_eq!(streamer.stats().loaded, 9);
        assert!(streamer.stats().evicted > 0);
    }

    #[test]
    fn test_loaded_meshes_match_their_surroundings_after_moving() {
        let mut streamer = streamer(1, GenerationMode::Inline);
        let atlas = AtlasLayout::default();
        let cameras = [
            Vec3::ZERO,
            Vec3::new(24.0, 80.0, 8.0),
            Vec3::new(24.0, 80.0, 24.0),
            Vec3::new(8.0, 80.0, 24.0),
        ];

        for camera in cameras {
            streamer.tick(camera);
            streamer.drain_jobs();

            let store = streamer.store();
            let mut checked = 0;
            for (pos, chunk) in store.snapshot() {
                let chunk = chunk.read();
                if chunk.state() != ChunkState::Loaded {
                    continue;
                }
                let neighbors = store.neighborhood(pos);
                if neighbors.resident_count() < 8 {
                    continue;
                }
                assert!(!chunk.needs_remesh, "{:?}", pos);
                let fresh = build_chunk_mesh(chunk.origin, &chunk.blocks, &neighbors, &atlas);
                assert!(fresh == chunk.mesh, "stale mesh at {:?} after camera {:?}", pos, camera);
                checked += 1;
            }
            assert!(checked > 0);
        }
    }

    #[test]
    fn test_block_edits_trigger_remesh_and_upload() {
        let mut streamer = streamer(1, GenerationMode::Inline);
        streamer.tick(Vec3::ZERO);
        streamer.drain_jobs();

        let top = surface(streamer.store(), 8, 8);
        let pos = ChunkPos::new(0, 0);
        let version = streamer.store().get_chunk(pos).unwrap().read().mesh_version;
        let uploads = streamer.uploader().uploads;

        assert!(streamer.break_block(top));
        assert_eq!(streamer.store().get_block(top).block, BlockType::Air);
        assert!(streamer.store().get_chunk(pos).unwrap().read().needs_remesh);

        streamer.tick(Vec3::ZERO);
        streamer.drain_jobs();

        let chunk = streamer.store().get_chunk(pos).unwrap();
        assert_eq!(chunk.read().mesh_version, version + 1);
        assert!(!chunk.read().needs_remesh);
        assert_eq!(chunk.read().state(), ChunkState::Loaded);
        assert!(streamer.uploader().uploads > uploads);
    }

    #[test]
    fn test_place_only_into_air_or_water() {
        let mut streamer = streamer(1, GenerationMode::Inline);
        streamer.tick(Vec3::ZERO);
        streamer.drain_jobs();

        let top = surface(streamer.store(), 3, 3);
        assert!(!streamer.place_block(top, BlockType::Stone));
        assert!(!streamer.place_block(top + IVec3::Y, BlockType::Air));
        assert!(streamer.place_block(top + IVec3::Y, BlockType::Dirt));
        assert_eq!(streamer.store().get_block(top + IVec3::Y).block, BlockType::Dirt);

        // Not resident
        assert!(!streamer.place_block(IVec3::new(400, 60, 0), BlockType::Dirt));
        assert!(!streamer.break_block(IVec3::new(400, 60, 0)));
    }

    #[test]
    fn test_pick_from_above_finds_surface() {
        let mut streamer = streamer(1, GenerationMode::Inline);
        streamer.tick(Vec3::ZERO);
        streamer.drain_jobs();

        let top = surface(streamer.store(), 5, 5);
        let eye = top.as_vec3() + Vec3::new(0.5, 4.0, 0.5);
        let hit = streamer.pick_block(eye, Vec3::NEG_Y).expect("surface under the eye");
        assert_eq!(hit.block.world, top);
        assert_eq!(hit.normal, IVec3::Y);
        assert!((hit.distance - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_draw_list_orders_by_distance() {
        let mut streamer = streamer(1, GenerationMode::Inline);
        streamer.tick(Vec3::ZERO);
        streamer.drain_jobs();

        let camera = Vec3::new(8.0, 70.0, 8.0);
        let list = streamer.draw_list(camera, None);
        assert_eq!(list.opaque.len(), 9);
        assert_eq!(list.opaque[0], ChunkPos::new(0, 0));

        let distance = |pos: &ChunkPos| {
            camera.distance_squared(Vec3::new(pos.center().x, WORLD_HEIGHT as f32 / 2.0, pos.center().z))
        };
        assert!(list.opaque.windows(2).all(|w| distance(&w[0]) <= distance(&w[1])));
        assert!(list.translucent.windows(2).all(|w| distance(&w[0]) >= distance(&w[1])));

        // Looking down +X from the far -X edge culls nothing in front and
        // everything behind
        let view = Mat4::look_at_rh(Vec3::new(-40.0, 70.0, 8.0), Vec3::new(0.0, 70.0, 8.0), Vec3::Y);
        let proj = Mat4::perspective_rh(70f32.to_radians(), 1.0, 0.1, 500.0);
        let planes = extract_frustum_planes(&(proj * view));
        let culled = streamer.draw_list(Vec3::new(-40.0, 70.0, 8.0), Some(&planes));
        assert!(!culled.opaque.is_empty());
        assert!(culled.opaque.len() <= 9);
    }
}
