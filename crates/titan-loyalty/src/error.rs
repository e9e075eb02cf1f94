//! # Error Types
//!
//! Domain-specific error types for titan-loyalty.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  titan-loyalty errors (this file)                                      │
//! │  ├── LoyaltyError     - Contract violations, config failures           │
//! │  └── ValidationError  - What exactly was wrong with an input           │
//! │                                                                         │
//! │  NOT errors (ordinary skips inside the calculator):                    │
//! │  • rule needs a code that wasn't entered                               │
//! │  • minimum amount / quantity not reached                               │
//! │  • unrecognized reward point mode                                      │
//! │                                                                         │
//! │  Flow: ValidationError → LoyaltyError::InvalidOrderLine → caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (line ID, field, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Loyalty Error
// =============================================================================

/// Errors surfaced by titan-loyalty.
#[derive(Debug, Error)]
pub enum LoyaltyError {
    /// An order line breaks its contract (e.g. no product reference).
    ///
    /// ## When This Occurs
    /// Upstream order construction produced a corrupt line. The whole
    /// calculation is rejected instead of silently skipping the line,
    /// which would hide the corruption behind a wrong point balance.
    #[error("Invalid order line {line_id}: {source}")]
    InvalidOrderLine {
        line_id: String,
        #[source]
        source: ValidationError,
    },

    /// Point arithmetic for a rule left the exact decimal range.
    #[error("Points for rule {rule_id} of program {program_id} overflowed")]
    PointsOverflow { program_id: String, rule_id: String },

    /// Configuration values are out of range.
    #[error("Invalid loyalty configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read.
    #[error("Failed to read config: {0}")]
    ConfigLoad(#[from] std::io::Error),

    /// Config file is not valid TOML for [`crate::config::LoyaltyConfig`].
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric field is NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: String, value: f64 },

    /// Number cannot be held exactly as a decimal.
    #[error("{field} is outside the supported decimal range, got {value}")]
    NotRepresentable { field: String, value: f64 },

    /// Arithmetic on the field's value overflowed.
    #[error("{field} overflows point arithmetic")]
    Overflow { field: String },

    /// Invalid format or inconsistent linkage.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with LoyaltyError.
pub type LoyaltyResult<T> = Result<T, LoyaltyError>;

// =============================================================================
// Unit Tests
// =============================================================================
