//! Error types for checkpoint inspection and histogram building.

use thiserror::Error;

/// Errors produced by the weightscope library.
#[derive(Debug, Error)]
pub enum WeightscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    #[error("parameter '{name}' not found in checkpoint ({available} parameters available)")]
    ParamNotFound { name: String, available: usize },

    #[error("unsupported dtype {dtype} for parameter '{name}'")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("no *.safetensors file found in directory: {0}")]
    NoCheckpoint(String),

    #[error("parameters '{first}' and '{second}' would both be written to {file}")]
    NameCollision { first: String, second: String, file: String },

    #[error("preview window must be at least 1")]
    EmptyWindow,

    #[error("bin count must be a positive even number, got {0}")]
    OddBinCount(usize),

    #[error("cutoff must be a positive finite number, got {0}")]
    InvalidCutoff(f32),

    #[error("no *.bin files in {dir} match pattern '{pattern}'")]
    NoMatchingFiles { dir: String, pattern: String },

    #[error("histogram range is zero: every matched value is 0")]
    DegenerateRange,

    #[error("flat binary file {path} has {len} bytes, not a multiple of 4")]
    Truncated { path: String, len: u64 },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, WeightscopeError>;
