use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while configuring or setting up a game. A running game never
/// fails; it only reaches an outcome.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("grid must have at least one row and one column (got {rows}x{cols})")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("maze has {available} open cells but {needed} are required")]
    NotEnoughOpenCells { needed: usize, available: usize },

    #[error("invalid placement: {0}")]
    InvalidPlacement(String),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
