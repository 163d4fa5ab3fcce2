//! Carts service.

use std::{
    fmt::{self, Debug},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{debug, info};

use crate::{
    domain::{
        carts::{
            data::CartItemsInput,
            errors::CartsServiceError,
            records::{CartRecord, CartUuid},
        },
        products::{ProductResolver, ProductsServiceError, records::ProductUuid},
        validation::ValidationError,
    },
    locks::KeyedLocks,
    store::Collection,
};

#[derive(Clone)]
pub struct StoreCartsService {
    carts: Arc<dyn Collection<CartRecord>>,
    products: Arc<dyn ProductResolver>,
    locks: Arc<KeyedLocks<CartUuid>>,
}

impl StoreCartsService {
    #[must_use]
    pub fn new(carts: Arc<dyn Collection<CartRecord>>, products: Arc<dyn ProductResolver>) -> Self {
        Self {
            carts,
            products,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    async fn load(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError> {
        self.carts
            .find_by_id(cart)
            .await?
            .ok_or(CartsServiceError::NotFound)
    }

    async fn save(&self, mut record: CartRecord) -> Result<CartRecord, CartsServiceError> {
        record.updated_at = Timestamp::now();

        self.carts
            .update_by_id(record.uuid, record)
            .await?
            .ok_or(CartsServiceError::NotFound)
    }

    /// Read, change and write one cart while holding its lock.
    ///
    /// `change` returns `false` when it left the cart as it was, in which case
    /// nothing is written.
    async fn modify<F>(&self, cart: CartUuid, change: F) -> Result<CartRecord, CartsServiceError>
    where
        F: FnOnce(&mut CartRecord) -> Result<bool, CartsServiceError> + Send,
    {
        let _guard = self.locks.lock(&cart).await;

        let mut record = self.load(cart).await?;

        if change(&mut record)? {
            self.save(record).await
        } else {
            Ok(record)
        }
    }

    async fn ensure_product_exists(&self, product: ProductUuid) -> Result<(), CartsServiceError> {
        match self.products.resolve(product).await {
            Ok(_) => Ok(()),
            Err(ProductsServiceError::NotFound) => Err(CartsServiceError::ProductNotFound(product)),
            Err(error) => Err(CartsServiceError::Products(error)),
        }
    }
}

impl Debug for StoreCartsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCartsService")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

fn require_quantity(quantity: u32) -> Result<(), ValidationError> {
    if quantity == 0 {
        return Err(ValidationError::InvalidQuantity { field: "quantity" });
    }

    Ok(())
}

#[async_trait]
impl CartsService for StoreCartsService {
    async fn create_cart(&self) -> Result<CartRecord, CartsServiceError> {
        let created = self.carts.insert(CartRecord::new(Timestamp::now())).await?;

        info!(cart = %created.uuid, "cart created");

        Ok(created)
    }

    async fn get_cart(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError> {
        let record = self.load(cart).await?;

        debug!(cart = %cart, lines = record.products.len(), "cart loaded");

        Ok(record)
    }

    async fn add_product(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError> {
        require_quantity(quantity)?;

        let updated = self
            .modify(cart, |record| {
                record.add(product, quantity);
                Ok(true)
            })
            .await?;

        info!(cart = %cart, product = %product, quantity, "product added to cart");

        Ok(updated)
    }

    async fn set_quantity(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError> {
        require_quantity(quantity)?;

        let updated = self
            .modify(cart, |record| {
                if record.set_quantity(product, quantity) {
                    Ok(true)
                } else {
                    Err(CartsServiceError::LineNotFound(product))
                }
            })
            .await?;

        info!(cart = %cart, product = %product, quantity, "cart quantity set");

        Ok(updated)
    }

    async fn remove_product(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let updated = self
            .modify(cart, |record| Ok(record.remove(product)))
            .await?;

        info!(cart = %cart, product = %product, "product removed from cart");

        Ok(updated)
    }

    async fn replace_products(
        &self,
        cart: CartUuid,
        items: CartItemsInput,
    ) -> Result<CartRecord, CartsServiceError> {
        let _guard = self.locks.lock(&cart).await;

        let mut record = self.load(cart).await?;
        let lines = items.merged();

        for line in &lines {
            self.ensure_product_exists(line.product_uuid).await?;
        }

        record.products = lines;

        let updated = self.save(record).await?;

        info!(cart = %cart, lines = updated.products.len(), "cart products replaced");

        Ok(updated)
    }

    async fn clear_cart(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError> {
        let updated = self
            .modify(cart, |record| {
                record.products.clear();
                Ok(true)
            })
            .await?;

        info!(cart = %cart, "cart cleared");

        Ok(updated)
    }

    async fn delete_cart(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError> {
        let _guard = self.locks.lock(&cart).await;

        let deleted = self
            .carts
            .delete_by_id(cart)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        info!(cart = %cart, "cart deleted");

        Ok(deleted)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Creates a new, empty cart.
    async fn create_cart(&self) -> Result<CartRecord, CartsServiceError>;

    /// Retrieve a single cart.
    async fn get_cart(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError>;

    /// Add `quantity` of a product, merging into its existing line.
    ///
    /// The product is not looked up; carts hold weak references.
    async fn add_product(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Overwrite the quantity of an existing line.
    async fn set_quantity(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Remove a product's line. Removing an absent line is not an error.
    async fn remove_product(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Replace every line at once. All referenced products must exist.
    async fn replace_products(
        &self,
        cart: CartUuid,
        items: CartItemsInput,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Remove every line.
    async fn clear_cart(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError>;

    /// Deletes a cart, returning the removed record.
    async fn delete_cart(&self, cart: CartUuid) -> Result<CartRecord, CartsServiceError>;
}
