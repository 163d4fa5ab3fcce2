//! Products service errors.

use thiserror::Error;

use crate::{domain::validation::ValidationError, store::StoreError};

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage error")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for ProductsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict { .. } => Self::AlreadyExists,
            error => Self::Storage(error),
        }
    }
}
