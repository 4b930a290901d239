//! Error types for Doc Router.

use std::path::PathBuf;

/// Top-level error type for the router.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Relocation error: {0}")]
    Relocation(#[from] RelocationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document-store errors.
///
/// `Connection` is the only run-fatal kind — a sweep that cannot reach the
/// store processes nothing. Everything else surfaces per record.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid table name: {0}")]
    InvalidTable(String),
}

/// File relocation errors. Non-fatal to the run: the pipeline logs them at
/// the record boundary and continues with the next document.
#[derive(Debug, thiserror::Error)]
pub enum RelocationError {
    #[error("Source file not found: {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create folder {}: {source}", path.display())]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the router.
pub type Result<T> = std::result::Result<T, Error>;
