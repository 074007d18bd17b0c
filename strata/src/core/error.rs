use thiserror::Error;

/// Core error type for the strata migration engine.
///
/// Raised when a value type refuses its input: blank identifiers or
/// unknown direction/status tags read back from storage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    /// An identifier was empty or whitespace only.
    #[error("{kind} must not be blank")]
    BlankId { kind: &'static str },

    /// An invalid direction string was encountered during parsing.
    #[error("invalid execution direction: {0}")]
    InvalidDirection(String),

    /// An invalid status string was encountered during parsing.
    #[error("invalid execution status: {0}")]
    InvalidStatus(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
