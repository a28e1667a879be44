pub mod settings;

pub use settings::{
    DebugSettings, EngineSettings, GenerationMode, StreamingSettings, WorldSettings,
    default_settings_path, load_or_default, load_settings, save_settings,
};
