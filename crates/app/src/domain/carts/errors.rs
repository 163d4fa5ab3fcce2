//! Carts service errors.

use thiserror::Error;

use crate::{
    domain::{
        products::{ProductsServiceError, records::ProductUuid},
        validation::ValidationError,
    },
    store::StoreError,
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart not found")]
    NotFound,

    #[error("cart has no line for product {0}")]
    LineNotFound(ProductUuid),

    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to resolve product")]
    Products(#[source] ProductsServiceError),

    #[error("storage error")]
    Storage(#[from] StoreError),
}
