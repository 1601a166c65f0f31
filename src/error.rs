//! Error types for the keel engine.

use std::path::PathBuf;
use thiserror::Error;

/// All errors the engine can surface to a caller.
#[derive(Debug, Error)]
pub enum KeelError {
    /// The file extension maps to no supported grammar.
    #[error("unsupported language for file: {0}")]
    UnsupportedLanguage(String),

    /// A single file could not be parsed. Recoverable during a scan:
    /// the file is skipped and recorded as a diagnostic.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A cycle survived cycle-breaking. Fatal to ordering, because every
    /// downstream consumer assumes the emitted order is dependency-safe.
    #[error("unresolved cycle among components: {}", remaining.join(", "))]
    CycleResolution { remaining: Vec<String> },

    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O failed for {path}")]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file exists but its content is not a valid registry.
    #[error("snapshot {path} is corrupt: {message}")]
    SnapshotFormat { path: PathBuf, message: String },

    /// The scan config file could not be parsed.
    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// A loaded snapshot references component ids that are not present.
    /// A registry with dangling edges is never accepted.
    #[error("snapshot references unknown components: {}", missing.join(", "))]
    InvalidSnapshot { missing: Vec<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KeelError>;
