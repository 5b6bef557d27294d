use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong inside the stats layer.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The configuration cannot be used — treated as fatal at startup.
    #[error("invalid stats configuration: {0}")]
    Config(String),

    /// A report or sample file could not be written. The periodic dump task
    /// logs these and skips the cycle instead of dying.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
