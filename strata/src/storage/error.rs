use crate::core::CoreError;
use thiserror::Error;

/// Storage layer error type for the strata migration engine.
///
/// Any of these is fatal to the run that hit it; retrying belongs to the
/// backend, not the executor.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// A database operation failed.
    #[cfg(feature = "sqlite")]
    #[error("database operation failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Could not open or reach the backing store.
    #[error("connection error: {0}")]
    Connection(String),

    /// A persisted row could not be turned back into a record.
    #[error("corrupt history row: {0}")]
    Corrupt(String),

    /// A persisted value failed core validation (blank id, unknown tag).
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, StorageError>;
