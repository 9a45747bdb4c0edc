//! Domain models for the pharmacy ledger.
//!
//! Every type here is built through a validating constructor so the
//! bookkeeping and reporting code can assume well-formed values.

mod cash;
mod insurance;
mod medicine;
mod record;

pub use cash::*;
pub use insurance::*;
pub use medicine::*;
pub use record::*;

use thiserror::Error;

/// Input validation errors raised at the model boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: &'static str, value: String },

    #[error("Units per pack must be at least 1")]
    InvalidPackSize,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Discount must be between 0 and 100 percent, got {0}")]
    InvalidDiscount(f64),

    #[error("Rates for {0} do not match the current inventory price")]
    RateMismatch(String),

    #[error("Unknown dosage form: {0}")]
    UnknownForm(String),

    #[error("Unknown gender: {0}")]
    UnknownGender(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("A record needs at least one medicine or doctor fees")]
    EmptyRecord,

    #[error("Nothing to export")]
    NothingToExport,

    #[error("Invalid import file: {0}")]
    InvalidImport(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Parse a currency amount typed by a user.
///
/// Blank input means zero. Anything else must be a finite, non-negative number.
pub fn parse_amount(field: &'static str, input: &str) -> ValidationResult<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ValidationError::InvalidAmount {
            field,
            value: input.to_string(),
        }),
    }
}

/// Validate a currency amount that is already numeric.
pub(crate) fn check_amount(field: &'static str, value: f64) -> ValidationResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidAmount {
            field,
            value: value.to_string(),
        })
    }
}

/// Trim a required text field, rejecting blank input.
pub(crate) fn required(field: &'static str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Current timestamp in the format stored on every model.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
