use std::path::PathBuf;

use gcmatch::ResolveError;
use thiserror::Error;

/// Errors of the batch driver.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid sample-name pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("malformed table: {0}")]
    Format(String),

    #[error("sample '{name}': {source}")]
    Sample { name: String, source: ResolveError },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl BatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BatchError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
