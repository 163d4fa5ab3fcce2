//! Cart Data

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::domain::{
    carts::records::CartItemRecord, products::records::ProductUuid,
    validation::ValidationError,
};

/// New Cart Line Data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}

/// Validated replacement for a cart's whole product list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartItemsInput {
    items: Vec<NewCartItem>,
}

impl CartItemsInput {
    /// Validate typed lines.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidQuantity`] for a line with quantity 0.
    pub fn new(items: Vec<NewCartItem>) -> Result<Self, ValidationError> {
        if items.iter().any(|item| item.quantity == 0) {
            return Err(ValidationError::InvalidQuantity { field: "quantity" });
        }

        Ok(Self { items })
    }

    /// Parse a raw JSON list of `{ "product": "<uuid>", "quantity": n }`
    /// entries. `quantity` defaults to 1.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] unless `raw` is a list of well-formed entries.
    pub fn parse(raw: &Value) -> Result<Self, ValidationError> {
        let Value::Array(entries) = raw else {
            return Err(ValidationError::Malformed {
                field: "products",
                reason: "expected a list".to_string(),
            });
        };

        let items = entries
            .iter()
            .map(parse_entry)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(items)
    }

    #[must_use]
    pub fn items(&self) -> &[NewCartItem] {
        &self.items
    }

    /// Cart lines with repeated products folded into one line, in order of
    /// first appearance.
    pub(crate) fn merged(&self) -> Vec<CartItemRecord> {
        let mut lines: Vec<CartItemRecord> = Vec::with_capacity(self.items.len());
        let mut positions: FxHashMap<ProductUuid, usize> = FxHashMap::default();

        for item in &self.items {
            if let Some(line) = positions
                .get(&item.product_uuid)
                .and_then(|&position| lines.get_mut(position))
            {
                line.quantity = line.quantity.saturating_add(item.quantity);
            } else {
                positions.insert(item.product_uuid, lines.len());
                lines.push(CartItemRecord {
                    product_uuid: item.product_uuid,
                    quantity: item.quantity,
                });
            }
        }

        lines
    }
}

fn parse_entry(entry: &Value) -> Result<NewCartItem, ValidationError> {
    let Value::Object(fields) = entry else {
        return Err(ValidationError::Malformed {
            field: "products",
            reason: "each entry must be an object".to_string(),
        });
    };

    let product_uuid = match fields.get("product") {
        None | Some(Value::Null) => {
            return Err(ValidationError::MissingField { field: "product" });
        }
        Some(Value::String(raw)) => {
            raw.parse()
                .map_err(|error: uuid::Error| ValidationError::Malformed {
                    field: "product",
                    reason: error.to_string(),
                })?
        }
        Some(_) => {
            return Err(ValidationError::Malformed {
                field: "product",
                reason: "expected a UUID string".to_string(),
            });
        }
    };

    let quantity = match fields.get("quantity") {
        None | Some(Value::Null) => 1,
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|quantity| u32::try_from(quantity).ok())
            .filter(|&quantity| quantity >= 1)
            .ok_or(ValidationError::InvalidQuantity { field: "quantity" })?,
        Some(_) => return Err(ValidationError::NotNumeric { field: "quantity" }),
    };

    Ok(NewCartItem {
        product_uuid,
        quantity,
    })
}
