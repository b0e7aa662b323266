//! Products service errors.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error("invalid price value")]
    InvalidPrice,

    #[error("product name must not be blank")]
    InvalidName,

    #[error("storage error")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for ProductsServiceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::RowNotFound => Self::NotFound,
            StorageError::UniqueViolation => Self::AlreadyExists,
            StorageError::Conflict | StorageError::Unavailable(_) => Self::Storage(error),
        }
    }
}
