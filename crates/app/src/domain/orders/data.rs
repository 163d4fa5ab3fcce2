//! Order Data

use serde::Deserialize;

use crate::domain::{
    carts::records::CartUuid,
    orders::records::{OrderStatus, ShippingAddress},
};

/// New Order Data
///
/// `cart` and `email` are required; they are optional here so a missing
/// value is reported as a validation error naming the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewOrder {
    pub cart: Option<CartUuid>,
    pub email: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
}

/// Order Update Data. Only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<ShippingAddress>,
}

impl OrderUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.shipping_address.is_none()
    }
}
