//! Products Data

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    products::records::{ProductRecord, ProductUuid},
    validation::{FlagInput, NumericInput, ValidationError, non_empty_text, required_text},
};

/// Product fields as supplied by a caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub price: Option<NumericInput>,
    pub stock: Option<NumericInput>,
    pub category: Option<String>,
    pub status: Option<FlagInput>,
    pub thumbnails: Option<Thumbnails>,
}

/// One thumbnail URL or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Thumbnails {
    One(String),
    Many(Vec<String>),
}

impl Thumbnails {
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(url) => vec![url],
            Self::Many(urls) => urls,
        }
    }
}

/// Validated New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub code: String,
    pub price: Decimal,
    pub stock: u32,
    pub category: String,
    pub status: bool,
    pub thumbnails: Vec<String>,
}

impl NewProduct {
    pub(crate) fn into_record(self, now: Timestamp) -> ProductRecord {
        ProductRecord {
            uuid: ProductUuid::new(),
            title: self.title,
            description: self.description,
            code: self.code,
            price: self.price,
            stock: self.stock,
            category: self.category,
            status: self.status,
            thumbnails: self.thumbnails,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<ProductInput> for NewProduct {
    type Error = ValidationError;

    fn try_from(input: ProductInput) -> Result<Self, Self::Error> {
        let title = required_text(input.title, "title")?;
        let description = required_text(input.description, "description")?;
        let code = required_text(input.code, "code")?;

        let price = input
            .price
            .ok_or(ValidationError::MissingField { field: "price" })?
            .to_amount("price")?;

        let stock = input
            .stock
            .ok_or(ValidationError::MissingField { field: "stock" })?
            .to_count("stock")?;

        let category = required_text(input.category, "category")?;

        let status = input
            .status
            .map(|status| status.to_flag("status"))
            .transpose()?
            .unwrap_or(true);

        Ok(Self {
            title,
            description,
            code,
            price,
            stock,
            category,
            status,
            thumbnails: input.thumbnails.map(Thumbnails::into_vec).unwrap_or_default(),
        })
    }
}

/// Product Update Data
///
/// Only supplied fields change. The product UUID is not part of the patch and
/// can never be rewritten.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub price: Option<NumericInput>,
    pub stock: Option<NumericInput>,
    pub category: Option<String>,
    pub status: Option<FlagInput>,
    pub thumbnails: Option<Thumbnails>,
}

impl ProductPatch {
    /// Validate every supplied field, then merge them over `record`.
    ///
    /// `record` is left untouched when any field is rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a blank text field or a price/stock
    /// that does not coerce.
    pub fn apply(self, record: &mut ProductRecord) -> Result<(), ValidationError> {
        let text = |value: Option<String>, field| {
            value.map(|value| non_empty_text(&value, field)).transpose()
        };

        let title = text(self.title, "title")?;
        let description = text(self.description, "description")?;
        let code = text(self.code, "code")?;
        let category = text(self.category, "category")?;
        let price = self.price.map(|price| price.to_amount("price")).transpose()?;
        let stock = self.stock.map(|stock| stock.to_count("stock")).transpose()?;
        let status = self
            .status
            .map(|status| status.to_flag("status"))
            .transpose()?;

        if let Some(title) = title {
            record.title = title;
        }

        if let Some(description) = description {
            record.description = description;
        }

        if let Some(code) = code {
            record.code = code;
        }

        if let Some(price) = price {
            record.price = price;
        }

        if let Some(stock) = stock {
            record.stock = stock;
        }

        if let Some(category) = category {
            record.category = category;
        }

        if let Some(status) = status {
            record.status = status;
        }

        if let Some(thumbnails) = self.thumbnails {
            record.thumbnails = thumbnails.into_vec();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn kettle() -> Result<ProductInput, serde_json::Error> {
        serde_json::from_value(json!({
            "title": "Kettle",
            "description": "1.7L",
            "code": "K-1",
            "price": 45,
            "stock": 35,
            "category": "Hervidores",
        }))
    }

    #[test]
    fn defaults_status_and_thumbnails() -> TestResult {
        let product = NewProduct::try_from(kettle()?)?;

        assert!(product.status, "status should default to true");
        assert!(product.thumbnails.is_empty(), "thumbnails should default to empty");
        assert_eq!(product.price, Decimal::new(45, 0));
        assert_eq!(product.stock, 35);

        Ok(())
    }

    #[test]
    fn single_thumbnail_is_wrapped_in_a_list() -> TestResult {
        let mut input = kettle()?;
        input.thumbnails = Some(Thumbnails::One("k.png".to_string()));

        let product = NewProduct::try_from(input)?;

        assert_eq!(product.thumbnails, ["k.png"]);

        Ok(())
    }

    #[test]
    fn numeric_strings_are_coerced() -> TestResult {
        let mut input = kettle()?;
        input.price = Some("12.50".into());
        input.stock = Some("7".into());

        let product = NewProduct::try_from(input)?;

        assert_eq!(product.price, Decimal::new(125, 1));
        assert_eq!(product.stock, 7);

        Ok(())
    }

    #[test]
    fn missing_required_field_is_named() -> TestResult {
        let mut input = kettle()?;
        input.category = None;

        let result = NewProduct::try_from(input);

        assert_eq!(
            result,
            Err(ValidationError::MissingField { field: "category" })
        );

        Ok(())
    }

    #[test]
    fn patch_merges_only_supplied_fields() -> TestResult {
        let mut record = NewProduct::try_from(kettle()?)?.into_record(Timestamp::now());
        let original = record.clone();

        ProductPatch {
            price: Some("50".into()),
            status: Some(false.into()),
            ..ProductPatch::default()
        }
        .apply(&mut record)?;

        assert_eq!(record.price, Decimal::new(50, 0));
        assert!(!record.status, "status should be updated");
        assert_eq!(record.uuid, original.uuid);
        assert_eq!(record.title, original.title);
        assert_eq!(record.code, original.code);

        Ok(())
    }

    #[test]
    fn wrong_typed_price_is_named_in_the_error() -> TestResult {
        let mut input = kettle()?;
        input.price = Some(serde_json::from_value(json!(true))?);

        let result = NewProduct::try_from(input);

        assert_eq!(result, Err(ValidationError::NotNumeric { field: "price" }));

        Ok(())
    }

    #[test]
    fn textual_status_is_coerced() -> TestResult {
        let input: ProductInput = serde_json::from_value(json!({
            "title": "Kettle",
            "description": "1.7L",
            "code": "K-1",
            "price": 45,
            "stock": 35,
            "category": "Hervidores",
            "status": "false",
        }))?;

        let product = NewProduct::try_from(input)?;

        assert!(!product.status, "\"false\" should disable the product");

        Ok(())
    }

    #[test]
    fn patch_cannot_rewrite_the_uuid() -> TestResult {
        let mut record = NewProduct::try_from(kettle()?)?.into_record(Timestamp::now());
        let uuid = record.uuid;

        let patch: ProductPatch = serde_json::from_value(json!({
            "uuid": ProductUuid::new(),
            "price": 1,
            "status": 0,
        }))?;

        patch.apply(&mut record)?;

        assert_eq!(record.uuid, uuid);
        assert_eq!(record.price, Decimal::ONE);
        assert!(!record.status, "0 should disable the product");

        Ok(())
    }

    #[test]
    fn unrecognised_status_is_rejected_by_name() -> TestResult {
        let mut record = NewProduct::try_from(kettle()?)?.into_record(Timestamp::now());
        let original = record.clone();

        let patch: ProductPatch = serde_json::from_value(json!({ "status": [] }))?;
        let result = patch.apply(&mut record);

        assert!(
            matches!(result, Err(ValidationError::Malformed { field: "status", .. })),
            "expected a status error, got {result:?}"
        );
        assert_eq!(record, original);

        Ok(())
    }

    #[test]
    fn rejected_patch_leaves_record_untouched() -> TestResult {
        let mut record = NewProduct::try_from(kettle()?)?.into_record(Timestamp::now());
        let original = record.clone();

        let result = ProductPatch {
            title: Some("Renamed".to_string()),
            stock: Some("lots".into()),
            ..ProductPatch::default()
        }
        .apply(&mut record);

        assert_eq!(result, Err(ValidationError::NotNumeric { field: "stock" }));
        assert_eq!(record, original);

        Ok(())
    }
}
