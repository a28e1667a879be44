//! Background worker for chunk generation, decoration and meshing.
//!
//! Jobs run one at a time in submission order. Every job carries a one-shot
//! channel so the submitter can poll or block on its outcome.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use parking_lot::{Condvar, Mutex};

use crate::core::chunk::ChunkState;
use crate::core::coords::ChunkPos;
use crate::error::EngineError;
use crate::render::atlas::AtlasLayout;
use crate::render::mesher::build_chunk_mesh;
use crate::utils::settings::WorldSettings;
use crate::world::generator::TerrainGenerator;
use crate::world::store::{ChunkStore, SharedChunk};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum JobKind {
    Generate,
    Decorate,
    Mesh,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JobStatus {
    Completed,
    /// The chunk was evicted (or replaced) before the job ran.
    Stale,
    /// The worker shut down before running the job.
    Cancelled,
}

#[derive(Clone, Copy, Debug)]
pub struct JobOutcome {
    pub pos: ChunkPos,
    pub kind: JobKind,
    pub status: JobStatus,
    pub elapsed: Duration,
}

pub struct MeshJob {
    pub kind: JobKind,
    pub pos: ChunkPos,
    pub chunk: SharedChunk,
    done: Sender<JobOutcome>,
}

/// Completion signal of a submitted job.
pub struct JobHandle {
    pub pos: ChunkPos,
    pub kind: JobKind,
    rx: Receiver<JobOutcome>,
}

impl JobHandle {
    fn cancelled(&self) -> JobOutcome {
        JobOutcome {
            pos: self.pos,
            kind: self.kind,
            status: JobStatus::Cancelled,
            elapsed: Duration::ZERO,
        }
    }

    /// Outcome if the job has finished, without blocking.
    pub fn try_complete(&self) -> Option<JobOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.cancelled()),
        }
    }

    /// Blocks until the job has finished.
    pub fn wait(self) -> JobOutcome {
        match self.rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => self.cancelled(),
        }
    }
}

struct QueueState {
    jobs: VecDeque<MeshJob>,
    running: bool,
}

struct JobQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl JobQueue {
    fn new() -> Self {
        JobQueue {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                running: true,
            }),
            available: Condvar::new(),
        }
    }

    fn push(&self, job: MeshJob) -> bool {
        let mut state = self.state.lock();
        if !state.running {
            return false;
        }
        state.jobs.push_back(job);
        drop(state);
        self.available.notify_one();
        true
    }

    /// Blocks until a job is available. `None` once the queue is stopped.
    fn pop(&self) -> Option<MeshJob> {
        let mut state = self.state.lock();
        while state.jobs.is_empty() && state.running {
            self.available.wait(&mut state);
        }
        if !state.running {
            return None;
        }
        state.jobs.pop_front()
    }

    fn stop(&self) {
        let dropped = {
            let mut state = self.state.lock();
            state.running = false;
            std::mem::take(&mut state.jobs)
        };
        // Dropping the jobs closes their channels
        drop(dropped);
        self.available.notify_all();
    }

    fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }
}

/// Everything a job needs, owned by the worker thread.
struct WorkerContext {
    store: Arc<ChunkStore>,
    generator: TerrainGenerator,
    atlas: AtlasLayout,
}

impl WorkerContext {
    fn run(&self, job: &MeshJob) -> JobStatus {
        // An evicted or recreated chunk must not be touched
        if !self.store.holds(job.pos, &job.chunk) {
            return JobStatus::Stale;
        }

        match job.kind {
            JobKind::Generate => {
                let mut chunk = job.chunk.write();
                if !chunk.generated {
                    self.generator.generate_terrain(&mut chunk);
                }
            }
            JobKind::Decorate => {
                self.generator.decorate(job.pos, &self.store);
            }
            JobKind::Mesh => {
                rebuild_mesh(&self.store, &job.chunk, &self.atlas);
            }
        }
        JobStatus::Completed
    }
}

/// Builds a fresh mesh for `chunk` from a snapshot of its grid and advances it
/// to `Ready`. Returns false if the chunk is not decorated yet.
///
/// No lock on `chunk` is held while neighbours are read.
pub fn rebuild_mesh(store: &ChunkStore, chunk: &SharedChunk, atlas: &AtlasLayout) -> bool {
    let (pos, origin, grid) = {
        let mut chunk = chunk.write();
        if chunk.state() < ChunkState::Decorated {
            return false;
        }
        chunk.needs_remesh = false;
        (chunk.pos, chunk.origin, chunk.blocks.clone())
    };

    let neighbors = store.neighborhood(pos);
    let mesh = build_chunk_mesh(origin, &grid, &neighbors, atlas);

    let mut chunk = chunk.write();
    chunk.install_mesh(mesh);
    chunk.advance_state(ChunkState::Ready);
    true
}

pub struct MeshWorker {
    queue: Arc<JobQueue>,
    thread: Option<JoinHandle<()>>,
}

impl MeshWorker {
    pub fn spawn(store: Arc<ChunkStore>, settings: &WorldSettings) -> Result<Self, EngineError> {
        let queue = Arc::new(JobQueue::new());
        let context = WorkerContext {
            store,
            generator: TerrainGenerator::new(settings),
            atlas: AtlasLayout::default(),
        };

        let name = "mesh-worker".to_string();
        let worker_queue = Arc::clone(&queue);
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Some(job) = worker_queue.pop() {
                    let start = Instant::now();
                    let status = context.run(&job);
                    let elapsed = start.elapsed();
                    tracing::trace!(
                        "{:?} job for {:?}: {:?} in {:?}",
                        job.kind,
                        job.pos,
                        status,
                        elapsed
                    );

                    // The submitter may have dropped its handle
                    let _ = job.done.send(JobOutcome {
                        pos: job.pos,
                        kind: job.kind,
                        status,
                        elapsed,
                    });
                }
                tracing::debug!("mesh worker stopped");
            })
            .map_err(|source| EngineError::WorkerSpawn { name, source })?;

        Ok(MeshWorker {
            queue,
            thread: Some(thread),
        })
    }

    /// Queues a job for `chunk`. After shutdown the handle reports
    /// `Cancelled` immediately.
    pub fn submit(&self, kind: JobKind, pos: ChunkPos, chunk: SharedChunk) -> JobHandle {
        let (done, rx) = bounded(1);
        self.queue.push(MeshJob {
            kind,
            pos,
            chunk,
            done,
        });
        JobHandle { pos, kind, rx }
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Stops the thread after its current job and waits for it. Queued jobs
    /// are dropped.
    pub fn shutdown(&mut self) {
        self.queue.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("mesh worker panicked");
            }
        }
    }
}

impl Drop for MeshWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<ChunkStore>, MeshWorker) {
        let store = Arc::new(ChunkStore::new());
        let worker = MeshWorker::spawn(Arc::clone(&store), &WorldSettings::default()).unwrap();
        (store, worker)
    }

    #[test]
    fn test_jobs_drive_chunk_to_ready() {
        let (store, worker) = setup();
        let pos = ChunkPos::new(0, 0);
        let chunk = store.create_chunk(pos).unwrap();

        let generate = worker.submit(JobKind::Generate, pos, Arc::clone(&chunk));
        let decorate = worker.submit(JobKind::Decorate, pos, Arc::clone(&chunk));
        let mesh = worker.submit(JobKind::Mesh, pos, Arc::clone(&chunk));

        assert_eq!(generate.wait().status, JobStatus::Completed);
        assert_eq!(decorate.wait().status, JobStatus::Completed);
        let outcome = mesh.wait();
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(outcome.kind, JobKind::Mesh);

        let chunk = chunk.read();
        assert!(chunk.generated);
        assert_eq!(chunk.state(), ChunkState::Ready);
        assert_eq!(chunk.mesh_version, 1);
        assert!(!chunk.mesh.opaque.is_empty());
    }

    #[test]
    fn test_evicted_chunk_jobs_are_stale() {
        let (store, worker) = setup();
        let pos = ChunkPos::new(4, 4);
        let old = store.create_chunk(pos).unwrap();
        store.destroy_chunk(pos);
        let fresh = store.create_chunk(pos).unwrap();

        let handle = worker.submit(JobKind::Generate, pos, Arc::clone(&old));
        assert_eq!(handle.wait().status, JobStatus::Stale);
        assert!(!old.read().generated);
        assert!(!fresh.read().generated);
    }

    #[test]
    fn test_shutdown_cancels_late_submissions() {
        let (store, mut worker) = setup();
        let pos = ChunkPos::new(0, 0);
        let chunk = store.create_chunk(pos).unwrap();

        worker.shutdown();
        let handle = worker.submit(JobKind::Generate, pos, chunk);
        let outcome = handle.try_complete().expect("closed channel reports at once");
        assert_eq!(outcome.status, JobStatus::Cancelled);
        assert_eq!(worker.queued(), 0);
    }

    #[test]
    fn test_rebuild_reads_neighbours_and_clears_flag() {
        let store = ChunkStore::new();
        let settings = WorldSettings::default();
        let generator = TerrainGenerator::new(&settings);
        let center = ChunkPos::new(0, 0);
        for pos in center.square_around(1) {
            let chunk = store.create_chunk(pos).unwrap();
            generator.generate_terrain(&mut chunk.write());
        }
        for pos in center.square_around(1) {
            generator.decorate(pos, &store);
        }

        let chunk = store.get_chunk(center).unwrap();
        chunk.write().needs_remesh = true;
        assert!(rebuild_mesh(&store, &chunk, &AtlasLayout::default()));

        let chunk = chunk.read();
        assert!(!chunk.needs_remesh);
        assert_eq!(chunk.state(), ChunkState::Ready);
        // Fully surrounded: no side face at the chunk border is exposed below
        // the lowest possible surface
        let exposed_low_side = chunk.mesh.opaque.vertices.iter().any(|v| {
            v.position[1] < 20.0 && v.normal[1] == 0.0
        });
        assert!(!exposed_low_side);
    }
}
