//! Errors raised at the fallible edges of the engine (settings files, worker
//! startup). Block and chunk access never fails; it uses sentinels instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is corrupt: {0}")]
    SettingsDecode(#[from] bincode::Error),

    #[error("failed to spawn worker thread `{name}`: {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no home directory to place settings in")]
    NoSettingsDir,
}
