//! # titan-loyalty: Loyalty Points for Titan POS
//!
//! Computes the loyalty points a POS order earns, including orders that
//! return products. Every calculation is a pure function over snapshots of
//! the order and its programs.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Titan Loyalty Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              POS order flow (out of this crate)                 │   │
//! │  │    Cart ──► Returns ──► Codes entered ──► Payment               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ lines + programs snapshot              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ titan-loyalty (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  points   │  │calculator │  │  expiry   │  │   │
//! │  │   │  Program  │  │  Points   │  │  awards   │  │  cards    │  │   │
//! │  │   │ OrderLine │  │ Rounding  │  │  per rule │  │  sweeps   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • PURE CALCULATIONS                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ program id → [Award]                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   Card balances, coupons, gift cards, e-wallets (callers)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Programs, rules, order lines, awards
//! - [`points`] - Decimal point values with explicit rounding
//! - [`calculator`] - Point awards per program
//! - [`expiry`] - Card and program balance expiry
//! - [`validation`] - Order line contract checks
//! - [`config`] - Precision and card validity settings
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Same order + programs = same awards
//! 2. **Signed Everything**: Returns are negative quantities and earn negative points
//! 3. **Decimal Points**: Rounding only where a rule says so, never by accident
//! 4. **Explicit Errors**: A corrupt order line is an error, a rule that does not
//!    apply is not
//!
//! ## Example Usage
//!
//! ```rust
//! use titan_loyalty::{points_for_programs, CalculationContext, OrderLine, Program, RewardPointMode, Rule};
//!
//! let program = Program {
//!     id: "loyalty".to_string(),
//!     rules: vec![Rule {
//!         id: "spend".to_string(),
//!         any_product: true,
//!         reward_point_mode: RewardPointMode::Money,
//!         reward_point_amount: 0.1,
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//! let line = OrderLine {
//!     id: "L1".to_string(),
//!     product_id: Some("coffee".to_string()),
//!     quantity: 2.0,
//!     price_with_tax: 20.0,
//!     price_without_tax: 18.0,
//!     ..Default::default()
//! };
//!
//! let result = points_for_programs(&[line], &[program], &CalculationContext::default()).unwrap();
//! assert_eq!(result.total_points("loyalty").to_f64(), 2.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod config;
pub mod error;
pub mod expiry;
pub mod points;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calculator::{
    is_feedback_reward_line, points_for_programs, CalculationContext, PointsCalculation,
    ProgramPoints, RuleApplication,
};
pub use config::LoyaltyConfig;
pub use error::{LoyaltyError, LoyaltyResult, ValidationError};
pub use points::{Points, Rounding};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Decimal places kept by money-based point rules.
pub const DEFAULT_POINTS_DECIMALS: u32 = 2;

/// Months a positive card balance stays valid after it last changed.
pub const DEFAULT_CARD_VALIDITY_MONTHS: u32 = 6;
