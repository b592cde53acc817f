//! Error types for sq-db

use thiserror::Error;

/// External tool errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connectivity probe failed (D001)
    #[error("[D001] Cannot connect to database: {0}")]
    ConnectionError(String),

    /// Schema dump failed (D002)
    #[error("[D002] pg_dump failed: {0}")]
    DumpError(String),

    /// Program could not be started (D003)
    #[error("[D003] Failed to launch '{program}': {source}")]
    LaunchError {
        program: String,
        source: std::io::Error,
    },
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;
