use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad scheduler parameters or run settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Init image or mask could not be decoded
    #[error("Input error: {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    /// Failure inside the synthesis engine
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{failed} of {total} runs failed (runs: {indices:?})")]
    BatchFailed {
        failed: usize,
        total: usize,
        indices: Vec<u32>,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn input(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Input { path: path.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
