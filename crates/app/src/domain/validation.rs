//! Input validation shared by the domain services.

use std::str::FromStr;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// Rejected input. Every variant names the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{field}` is required")]
    MissingField { field: &'static str },

    #[error("`{field}` cannot be empty")]
    EmptyField { field: &'static str },

    #[error("`{field}` must be a number")]
    NotNumeric { field: &'static str },

    #[error("`{field}` cannot be negative")]
    Negative { field: &'static str },

    #[error("`{field}` must be a whole number")]
    NotInteger { field: &'static str },

    #[error("`{field}` must be at least 1")]
    InvalidQuantity { field: &'static str },

    #[error("`{email}` is not a valid email address")]
    InvalidEmail { email: String },

    #[error("`{status}` is not a valid order status")]
    InvalidStatus { status: String },

    #[error("cart has no products")]
    EmptyCart,

    #[error("`{field}` is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl ValidationError {
    /// Name of the field the error refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field }
            | Self::EmptyField { field }
            | Self::NotNumeric { field }
            | Self::Negative { field }
            | Self::NotInteger { field }
            | Self::InvalidQuantity { field }
            | Self::Malformed { field, .. } => field,
            Self::InvalidEmail { .. } => "email",
            Self::InvalidStatus { .. } => "status",
            Self::EmptyCart => "cart",
        }
    }
}

/// A number supplied either as a JSON number or as numeric text.
///
/// Any other JSON value is kept so validation can reject it by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(Number),
    Text(String),
    Other(Value),
}

impl NumericInput {
    /// Coerce to a non-negative decimal.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming `field` when the value is blank,
    /// not numeric or negative.
    pub fn to_amount(&self, field: &'static str) -> Result<Decimal, ValidationError> {
        let value = self.to_decimal(field)?;

        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValidationError::Negative { field });
        }

        Ok(value.normalize())
    }

    /// Coerce to a non-negative whole number.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming `field` when the value is blank,
    /// not numeric, negative, fractional or out of range.
    pub fn to_count(&self, field: &'static str) -> Result<u32, ValidationError> {
        let value = self.to_amount(field)?;

        if !value.fract().is_zero() {
            return Err(ValidationError::NotInteger { field });
        }

        value.to_u32().ok_or_else(|| ValidationError::Malformed {
            field,
            reason: "value is too large".to_string(),
        })
    }

    fn to_decimal(&self, field: &'static str) -> Result<Decimal, ValidationError> {
        let text = match self {
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.trim().to_string(),
            Self::Other(_) => return Err(ValidationError::NotNumeric { field }),
        };

        if text.is_empty() {
            return Err(ValidationError::EmptyField { field });
        }

        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| ValidationError::NotNumeric { field })
    }
}

impl From<u32> for NumericInput {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for NumericInput {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<Decimal> for NumericInput {
    fn from(value: Decimal) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A flag supplied as a JSON boolean, a number or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagInput(Value);

impl FlagInput {
    /// Coerce to a boolean. Numbers are true unless zero; text accepts
    /// `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off` in any case, and
    /// blank text is false.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Malformed`] naming `field` for any other
    /// text, an array or an object.
    pub fn to_flag(&self, field: &'static str) -> Result<bool, ValidationError> {
        let malformed = || ValidationError::Malformed {
            field,
            reason: "expected a boolean".to_string(),
        };

        match &self.0 {
            Value::Bool(flag) => Ok(*flag),
            Value::Number(number) => NumericInput::Number(number.clone())
                .to_decimal(field)
                .map(|number| !number.is_zero()),
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" | "" => Ok(false),
                _ => Err(malformed()),
            },
            Value::Null | Value::Array(_) | Value::Object(_) => Err(malformed()),
        }
    }
}

impl From<bool> for FlagInput {
    fn from(value: bool) -> Self {
        Self(Value::Bool(value))
    }
}

/// Trim a required text field, rejecting absent and blank values.
pub(crate) fn required_text(
    value: Option<String>,
    field: &'static str,
) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField { field })?;

    non_empty_text(&value, field)
}

/// Trim a text field that, when supplied, may not be blank.
pub(crate) fn non_empty_text(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }

    Ok(trimmed.to_string())
}
