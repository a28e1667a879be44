use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::EngineError;

pub const SETTINGS_FILE: &str = "settings.bin";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct EngineSettings {
    pub world: WorldSettings,
    pub streaming: StreamingSettings,
    #[serde(default)]
    pub debug: DebugSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorldSettings {
    pub seed: u32,
    /// Tree noise must exceed this for a column to be a tree candidate.
    pub tree_threshold: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            tree_threshold: DEFAULT_TREE_THRESHOLD,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Terrain and decoration run on the thread calling `tick`.
    Inline,
    /// Terrain and decoration are queued on the worker with the meshes.
    Background,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StreamingSettings {
    pub view_distance: i32,
    pub generation: GenerationMode,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            view_distance: DEFAULT_VIEW_DISTANCE,
            generation: GenerationMode::Inline,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DebugSettings {
    pub log_stats: bool,
    pub log_job_timings: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            log_stats: true,
            log_job_timings: false,
        }
    }
}

/// `settings.bin` under the platform config directory.
pub fn default_settings_path() -> Result<PathBuf, EngineError> {
    let dirs = directories::ProjectDirs::from("", "", "voxelstream")
        .ok_or(EngineError::NoSettingsDir)?;
    Ok(dirs.config_dir().join(SETTINGS_FILE))
}

pub fn save_settings(path: &Path, settings: &EngineSettings) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, settings)?;
    Ok(())
}

pub fn load_settings(path: &Path) -> Result<EngineSettings, EngineError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let settings = bincode::deserialize_from(&mut reader)?;
    Ok(settings)
}

/// Loads `path`, falling back to defaults when the file is missing or
/// unreadable.
pub fn load_or_default(path: &Path) -> EngineSettings {
    match load_settings(path) {
        Ok(settings) => settings,
        Err(EngineError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no settings at {}, using defaults", path.display());
            EngineSettings::default()
        }
        Err(e) => {
            tracing::warn!("ignoring settings at {}: {}", path.display(), e);
            EngineSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_survive_save_and_load() {
        let dir = std::env::temp_dir().join(format!("voxelstream-settings-{}", std::process::id()));
        let path = dir.join(SETTINGS_FILE);

        let mut settings = EngineSettings::default();
        settings.world.seed = 42;
        settings.streaming.view_distance = 7;
        settings.streaming.generation = GenerationMode::Background;

        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("voxelstream-does-not-exist/settings.bin");
        assert!(matches!(load_settings(&path), Err(EngineError::Io(_))));
        assert_eq!(load_or_default(&path), EngineSettings::default());
    }
}
