//! Storage errors shared by the repositories.
//!
//! Repositories report failures with [`StorageError`]; each service converts
//! it into its own error type, collapsing "row missing" and "duplicate key"
//! into domain variants and keeping everything else as an opaque storage
//! failure.

use thiserror::Error;

/// Repository failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The addressed row does not exist.
    #[error("row not found")]
    RowNotFound,

    /// A row with the same key already exists.
    #[error("unique constraint violated")]
    UniqueViolation,

    /// A conditional write lost against a concurrent writer.
    #[error("row was modified concurrently")]
    Conflict,

    /// The backing store could not serve the request.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
