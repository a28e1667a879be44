//! Headless voxel streaming driver
//!
//! Walks a camera across the world and logs streaming statistics.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;

use voxelstream::utils::{default_settings_path, load_or_default, save_settings};
use voxelstream::{CHUNK_SIZE, ChunkStreamer, EngineError, GenerationMode, HeadlessUploader};

/// Headless voxel chunk streamer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World seed (overrides the settings file)
    #[arg(long)]
    seed: Option<u32>,

    /// View distance in chunks (overrides the settings file)
    #[arg(long)]
    view_distance: Option<i32>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 64)]
    ticks: u32,

    /// Generate and decorate chunks on the worker thread
    #[arg(long, default_value_t = false)]
    background_generation: bool,

    /// Settings file to load
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long, default_value_t = false)]
    save_settings: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Args::parse()) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), EngineError> {
    let path = match args.settings {
        Some(path) => path,
        None => default_settings_path()?,
    };
    let mut settings = load_or_default(&path);
    if let Some(seed) = args.seed {
        settings.world.seed = seed;
    }
    if let Some(view_distance) = args.view_distance {
        settings.streaming.view_distance = view_distance;
    }
    if args.background_generation {
        settings.streaming.generation = GenerationMode::Background;
    }
    if args.save_settings {
        save_settings(&path, &settings)?;
        tracing::info!("saved settings to {}", path.display());
    }

    tracing::info!("Starting headless streamer...");
    let mut streamer = ChunkStreamer::new(&settings, HeadlessUploader::new())?;

    // Half a block per tick along +X at a fixed eye height
    let mut camera = Vec3::new(0.5, 90.0, 0.5);
    for tick in 0..args.ticks {
        streamer.tick(camera);
        if settings.debug.log_stats {
            let stats = streamer.stats();
            tracing::info!(
                "tick {}: chunk ({}, {}) resident {} loaded {} pending {} meshes {} ({:?} tick, {:?} last mesh)",
                tick,
                (camera.x / CHUNK_SIZE as f32).floor(),
                (camera.z / CHUNK_SIZE as f32).floor(),
                stats.resident,
                stats.loaded,
                stats.pending_jobs,
                stats.meshes_built,
                stats.last_tick,
                stats.last_mesh_time
            );
        }
        camera.x += 0.5;
    }

    streamer.drain_jobs();
    let stats = streamer.stats();
    tracing::info!(
        "done: {} resident, {} loaded, {} meshes built, {} evicted, {} KiB uploaded",
        stats.resident,
        stats.loaded,
        stats.meshes_built,
        stats.evicted,
        streamer.uploader().total_bytes() / 1024
    );
    Ok(())
}
