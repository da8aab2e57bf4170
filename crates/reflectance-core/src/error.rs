use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid scan pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to read path during scan: {0}")]
    Scan(#[from] glob::GlobError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{path}: line {line}: {message}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path}: wavelength labels do not match those of {canonical_path}")]
    WavelengthMismatch {
        path: PathBuf,
        canonical_path: PathBuf,
    },

    #[error("{path}: expected {expected} directory levels below the root, found {found}")]
    DepthMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("no measurement files found under {root}")]
    EmptyTree { root: PathBuf },

    #[error("no wavelength column within {tolerance} nm of {target} nm")]
    EmptyBand { target: f64, tolerance: f64 },

    #[error("Data processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
