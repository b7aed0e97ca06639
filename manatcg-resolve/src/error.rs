//! Error types for manatcg-resolve
//!
//! Fatal conditions only. Per-row problems (malformed rows, failed authority
//! lookups, broken review surfaces) are logged and absorbed where they occur.

use std::path::PathBuf;
use thiserror::Error;

/// Resolution run error
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Reference dataset file does not exist
    #[error("Reference dataset not found: {0}")]
    ReferenceNotFound(PathBuf),

    /// Collection export file does not exist
    #[error("Collection export not found: {0}")]
    CollectionNotFound(PathBuf),

    /// CSV file could not be opened or written
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Promo filter pattern failed to compile
    #[error("Invalid filter pattern: {0}")]
    InvalidFilter(String),

    /// Deferred item added after review started
    #[error("Deferred queue is frozen; review has already started")]
    QueueFrozen,

    /// Review produced a different number of decisions than queued items
    #[error("Review returned {got} decisions for {expected} deferred items")]
    ReviewMismatch { expected: usize, got: usize },

    /// Review task panicked or was cancelled
    #[error("Review task failed: {0}")]
    ReviewTask(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// manatcg-common error
    #[error("Common error: {0}")]
    Common(#[from] manatcg_common::Error),
}

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;
