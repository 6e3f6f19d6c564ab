//! Error types.

use std::path::PathBuf;

/// Errors produced while configuring a simulator or loading traces.
///
/// Nothing on the per-branch path can fail; these only come from setup
/// and I/O around a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("malformed trace: {0}")]
    Trace(#[from] TraceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Violations of the [`SimConfig`](crate::SimConfig) invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("BTB size must be a non-zero power of two (got {0})")]
    BtbSizeNotPowerOfTwo(usize),

    #[error("history length must be at least 1")]
    ZeroHistoryLength,

    #[error("training threshold must be finite and non-negative (got {0})")]
    InvalidTheta(f32),
}

/// Problems with the contents of a binary trace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    #[error("{}: length {len} is not a multiple of the record size", .path.display())]
    Truncated { path: PathBuf, len: usize },

    #[error("invalid branch flags {flags:#07b} at byte offset {offset}")]
    InvalidFlags { flags: u32, offset: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
