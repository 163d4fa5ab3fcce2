//! Product Records

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{store::Document, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Product Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub title: String,
    pub description: String,
    pub code: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    pub stock: u32,
    pub category: String,
    pub status: bool,
    pub thumbnails: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document for ProductRecord {
    const COLLECTION: &'static str = "products";
    const UNIQUE_FIELDS: &'static [&'static str] = &["code"];

    fn id(&self) -> ProductUuid {
        self.uuid
    }
}
