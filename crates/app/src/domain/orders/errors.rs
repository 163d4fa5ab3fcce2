//! Orders service errors.

use thiserror::Error;

use crate::{
    domain::{
        carts::{CartsServiceError, records::CartUuid},
        products::{ProductsServiceError, records::ProductUuid},
        validation::ValidationError,
    },
    store::StoreError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("cart {0} not found")]
    CartNotFound(CartUuid),

    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to load cart")]
    Carts(#[source] CartsServiceError),

    #[error("failed to resolve product")]
    Products(#[source] ProductsServiceError),

    #[error("storage error")]
    Storage(#[from] StoreError),
}
