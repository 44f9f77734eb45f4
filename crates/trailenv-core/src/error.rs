//! Crate-wide error type.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrailEnvError>;

#[derive(Debug, Error)]
pub enum TrailEnvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("asset not found: {id} (looked in {path:?})")]
    AssetNotFound { id: String, path: PathBuf },

    #[error("scene has no band named {0:?}")]
    MissingBand(String),

    #[error("grid dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("no trail geometry left after clipping to the area of interest")]
    EmptyAfterClip,

    #[error("cannot reduce an empty scene collection (band {0:?})")]
    EmptyCollection(String),

    #[error("unclassified ecosystem code {value} at cell ({row}, {col})")]
    UnclassifiedValue { value: f32, row: usize, col: usize },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("export job {0:?} failed: {1}")]
    ExportFailed(String, String),

    #[error("export job {0:?} panicked")]
    JobPanicked(String),
}
