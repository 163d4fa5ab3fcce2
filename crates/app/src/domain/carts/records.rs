//! Cart Records

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{domain::products::records::ProductUuid, store::Document, uuids::TypedUuid};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart Record
///
/// Holds at most one line per product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartRecord {
    pub uuid: CartUuid,
    pub products: Vec<CartItemRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Cart Line Record
///
/// `product_uuid` is a weak reference; the product may since have been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemRecord {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}

impl CartRecord {
    /// An empty cart under a fresh UUID.
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self {
            uuid: CartUuid::new(),
            products: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn line(&self, product: ProductUuid) -> Option<&CartItemRecord> {
        self.products.iter().find(|line| line.product_uuid == product)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Increase the product's line by `quantity`, appending a line when absent.
    pub(crate) fn add(&mut self, product: ProductUuid, quantity: u32) {
        match self.line_mut(product) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.products.push(CartItemRecord {
                product_uuid: product,
                quantity,
            }),
        }
    }

    /// Overwrite the quantity of an existing line. Returns `false` when absent.
    pub(crate) fn set_quantity(&mut self, product: ProductUuid, quantity: u32) -> bool {
        self.line_mut(product)
            .map(|line| line.quantity = quantity)
            .is_some()
    }

    /// Drop the product's line. Returns `false` when there was none.
    pub(crate) fn remove(&mut self, product: ProductUuid) -> bool {
        let before = self.products.len();

        self.products.retain(|line| line.product_uuid != product);

        self.products.len() != before
    }

    fn line_mut(&mut self, product: ProductUuid) -> Option<&mut CartItemRecord> {
        self.products
            .iter_mut()
            .find(|line| line.product_uuid == product)
    }
}

impl Document for CartRecord {
    const COLLECTION: &'static str = "carts";

    fn id(&self) -> CartUuid {
        self.uuid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_twice_increments_one_line() {
        let mut cart = CartRecord::new(Timestamp::now());
        let product = ProductUuid::new();

        cart.add(product, 1);
        cart.add(product, 1);

        assert_eq!(cart.products.len(), 1, "expected a single line");
        assert_eq!(cart.line(product).map(|line| line.quantity), Some(2));
    }

    #[test]
    fn lines_keep_insertion_order() {
        let mut cart = CartRecord::new(Timestamp::now());
        let first = ProductUuid::new();
        let second = ProductUuid::new();

        cart.add(first, 1);
        cart.add(second, 3);
        cart.add(first, 2);

        let lines: Vec<(ProductUuid, u32)> = cart
            .products
            .iter()
            .map(|line| (line.product_uuid, line.quantity))
            .collect();

        assert_eq!(lines, [(first, 3), (second, 3)]);
    }

    #[test]
    fn set_quantity_requires_an_existing_line() {
        let mut cart = CartRecord::new(Timestamp::now());
        let product = ProductUuid::new();

        assert!(!cart.set_quantity(product, 4), "no line to update yet");

        cart.add(product, 1);

        assert!(cart.set_quantity(product, 4), "line should be updated");
        assert_eq!(cart.line(product).map(|line| line.quantity), Some(4));
    }

    #[test]
    fn removing_an_absent_line_changes_nothing() {
        let mut cart = CartRecord::new(Timestamp::now());
        let kept = ProductUuid::new();

        cart.add(kept, 2);
        let before = cart.products.clone();

        assert!(!cart.remove(ProductUuid::new()), "nothing should be removed");
        assert_eq!(cart.products, before);
    }
}
