//! Error types for wellness fusion

use thiserror::Error;

/// Errors that can occur at the analyzer, sink and configuration boundaries.
///
/// None of these are fatal to a monitor cycle: the coordinator degrades each
/// one to an absent or neutral value at the smallest scope it can.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Analyzer failed: {0}")]
    Analyzer(String),

    /// A backing engine is missing or failed to load
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Sink append failed: {0}")]
    Sink(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
