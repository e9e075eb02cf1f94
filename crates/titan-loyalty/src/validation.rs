//! # Validation Module
//!
//! Contract checks for order lines before points are computed.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      What Gets Validated                                │
//! │                                                                         │
//! │  Order lines (caller data, may be corrupt)                             │
//! │  ├── product reference present                                         │
//! │  ├── quantity / prices are finite and fit in a Decimal                 │
//! │  └── gift card barcode and card id come together                       │
//! │                                                                         │
//! │  Programs & rules (trusted configuration)                              │
//! │  └── NOT validated - odd values simply earn nothing                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use titan_loyalty::types::OrderLine;
//! use titan_loyalty::validation::validate_order_line;
//!
//! let line = OrderLine {
//!     id: "L1".to_string(),
//!     product_id: Some("coffee".to_string()),
//!     quantity: -1.0,
//!     price_with_tax: -3.5,
//!     price_without_tax: -3.2,
//!     ..Default::default()
//! };
//! assert!(validate_order_line(&line).is_ok());
//! ```

use rust_decimal::prelude::*;

use crate::error::{LoyaltyError, LoyaltyResult, ValidationError};
use crate::types::OrderLine;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates that a number is finite. Negative values are fine (returns).
///
/// ## Example
/// ```rust
/// use titan_loyalty::validation::validate_finite;
///
/// assert!(validate_finite(-3.0, "quantity").is_ok());
/// assert!(validate_finite(f64::NAN, "quantity").is_err());
/// ```
pub fn validate_finite(value: f64, field: &str) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

/// Validates that a finite number also fits `Decimal` (|value| < ~7.9e28).
///
/// Values past that range would otherwise convert to zero and earn nothing.
pub fn validate_decimal(value: f64, field: &str) -> ValidationResult<()> {
    validate_finite(value, field)?;

    if Decimal::from_f64(value).is_none() {
        return Err(ValidationError::NotRepresentable {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

/// Validates a required identifier. Blank ids are rejected, the id itself
/// is returned untouched.
pub fn validate_required_id<'a>(id: Option<&'a str>, field: &str) -> ValidationResult<&'a str> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ValidationError::Required {
            field: field.to_string(),
        }),
    }
}

// =============================================================================
// Order Line Validator
// =============================================================================

/// Validates a single order line and returns its product id.
///
/// ## Rules
/// - `product_id` must be present and non-empty
/// - `quantity`, `price_with_tax`, `price_without_tax` must be finite and
///   within `Decimal` range
/// - a gift card link needs both a barcode and a card id
pub fn validate_order_line(line: &OrderLine) -> ValidationResult<&str> {
    let product_id = validate_required_id(line.product_id.as_deref(), "product_id")?;

    validate_decimal(line.quantity, "quantity")?;
    validate_decimal(line.price_with_tax, "price_with_tax")?;
    validate_decimal(line.price_without_tax, "price_without_tax")?;

    if let Some(gift_card) = &line.gift_card {
        if gift_card.barcode.trim().is_empty() || gift_card.card_id.trim().is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: "gift_card".to_string(),
                reason: "barcode and card id must both be set".to_string(),
            });
        }
    }

    Ok(product_id)
}

/// Validates every line, failing fast on the first broken one.
///
/// Returns the lines paired with their product ids, in order.
pub fn validate_order_lines(lines: &[OrderLine]) -> LoyaltyResult<Vec<(&OrderLine, &str)>> {
    lines
        .iter()
        .map(|line| {
            validate_order_line(line)
                .map(|product_id| (line, product_id))
                .map_err(|source| LoyaltyError::InvalidOrderLine {
                    line_id: line.id.clone(),
                    source,
                })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
