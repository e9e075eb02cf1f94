//! # Domain Types
//!
//! Read-only snapshots of the POS order and its loyalty configuration, plus
//! the [`Award`] values the calculator produces.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Program      │   │      Rule       │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  id             │   │  quantity (±)   │       │
//! │  │  program_type   │   │  any_product    │   │  product_id     │       │
//! │  │  trigger        │   │  mode           │   │  prices ±tax    │       │
//! │  │  applies_on     │   │  minimums       │   │  reward?        │       │
//! │  │  rules[]        │   │  point mode     │   │  gift card?     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │                        ┌─────────────────┐                              │
//! │                        │     Award       │  ◄── calculator output       │
//! │                        │  points (±)     │                              │
//! │                        │  gift card tag? │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pre-resolved Configuration
//! Product filters arrive already materialized as id sets, and reward lines
//! carry a snapshot of the program their reward came from. Nothing here
//! looks anything up.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::points::Points;

// =============================================================================
// Program Enums
// =============================================================================

/// The kind of loyalty scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    /// Ordinary points program.
    #[default]
    Loyalty,
    /// Coupon issuing. Always receives an award slot, even at zero points.
    Coupons,
    /// Gift card issuing.
    GiftCard,
    /// Prepaid e-wallet.
    Ewallet,
    /// Automatic promotions.
    Promotion,
    /// Promotion applied on the next order.
    NextOrderCoupons,
    /// Promo code.
    PromoCode,
    /// Buy X get Y.
    BuyXGetY,
}

impl ProgramType {
    /// Gift cards and e-wallets hold money, not loyalty points. Their reward
    /// lines must never earn points for another program.
    #[inline]
    pub fn is_wallet_like(&self) -> bool {
        matches!(self, ProgramType::GiftCard | ProgramType::Ewallet)
    }
}

/// How a program gets attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProgramTrigger {
    /// Applied automatically.
    #[default]
    Auto,
    /// Requires a code or a manual action.
    WithCode,
}

/// Which order the program's rewards are meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AppliesOn {
    /// Rewards are consumed in the same order.
    #[default]
    Current,
    /// Rewards are issued for a later order (coupons, gift cards).
    Future,
    /// Both.
    Both,
}

// =============================================================================
// Rule Enums
// =============================================================================

/// Whether a rule is always evaluated or only after its code was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    #[default]
    Auto,
    WithCode,
}

/// Which amount the rule's minimum is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MinimumAmountTaxMode {
    /// Tax-inclusive amount.
    #[default]
    Incl,
    /// Tax-exclusive amount.
    Excl,
}

/// How a rule converts order activity into points.
///
/// ## Earning Modes
/// ```text
/// Order  → flat `amount` once per qualifying order
/// Unit   → `amount` × qualifying quantity
/// Money  → `amount` × qualifying amount paid (tax incl.)
/// ```
///
/// Unrecognized values deserialize to [`RewardPointMode::Unknown`], which
/// earns nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardPointMode {
    #[default]
    Order,
    Unit,
    Money,
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Rule
// =============================================================================

/// An earning rule. Belongs to exactly one [`Program`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,

    /// Matches every product when set.
    #[serde(default)]
    pub any_product: bool,

    /// Products the rule applies to (materialized product domain).
    #[serde(default)]
    pub valid_product_ids: HashSet<String>,

    #[serde(default)]
    pub mode: RuleMode,

    /// Minimum amount the matching lines must reach (absolute value).
    #[serde(default)]
    pub minimum_amount: f64,

    #[serde(default)]
    pub minimum_amount_tax_mode: MinimumAmountTaxMode,

    /// Minimum quantity the matching lines must reach (absolute value).
    #[serde(default)]
    pub minimum_qty: f64,

    #[serde(default)]
    pub reward_point_mode: RewardPointMode,

    /// Flat value (order mode) or rate (unit / money modes).
    #[serde(default)]
    pub reward_point_amount: f64,

    /// Issue one award per unit instead of one lump sum.
    #[serde(default)]
    pub reward_point_split: bool,
}

impl Rule {
    /// Checks the rule's product applicability.
    #[inline]
    pub fn applies_to(&self, product_id: &str) -> bool {
        self.any_product || self.valid_product_ids.contains(product_id)
    }

    /// Whether the rule is evaluated for this order.
    #[inline]
    pub fn is_active(&self, activated_rule_ids: &HashSet<String>) -> bool {
        match self.mode {
            RuleMode::Auto => true,
            RuleMode::WithCode => activated_rule_ids.contains(&self.id),
        }
    }
}

// =============================================================================
// Program
// =============================================================================

/// A configured loyalty scheme with its ordered rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    #[serde(default)]
    pub program_type: ProgramType,
    #[serde(default)]
    pub trigger: ProgramTrigger,
    #[serde(default)]
    pub applies_on: AppliesOn,
    /// Evaluated in this order.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

// =============================================================================
// Reward Linkage
// =============================================================================

/// Kind of reward a reward line redeems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    Discount,
    Product,
}

/// Snapshot of the program a reward belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardProgram {
    pub id: String,
    #[serde(default)]
    pub program_type: ProgramType,
    #[serde(default)]
    pub trigger: ProgramTrigger,
}

/// The reward redeemed by a reward line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRef {
    pub id: String,
    pub reward_type: RewardType,
    pub program: RewardProgram,
}

impl RewardRef {
    /// Discount rewards of automatically triggered programs.
    #[inline]
    pub fn is_auto_discount(&self) -> bool {
        self.reward_type == RewardType::Discount && self.program.trigger == ProgramTrigger::Auto
    }
}

/// Gift card linked to the line that sells it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCardLink {
    pub barcode: String,
    pub card_id: String,
}

// =============================================================================
// Order Line
// =============================================================================

/// A line of the POS order.
///
/// Negative quantities are returns; their prices are negative too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,

    /// Required. A line without a product is rejected.
    #[serde(default)]
    pub product_id: Option<String>,

    pub quantity: f64,

    /// Line total including tax.
    pub price_with_tax: f64,

    /// Line total excluding tax.
    pub price_without_tax: f64,

    /// Set when the line redeems a reward instead of selling a product.
    #[serde(default)]
    pub reward: Option<RewardRef>,

    /// Product a reward line substitutes for.
    #[serde(default)]
    pub reward_product_id: Option<String>,

    /// Gift card sold by this line.
    #[serde(default)]
    pub gift_card: Option<GiftCardLink>,

    /// Programs this line opts out of.
    #[serde(default)]
    pub ignored_program_ids: HashSet<String>,
}

impl OrderLine {
    #[inline]
    pub fn is_reward_line(&self) -> bool {
        self.reward.is_some()
    }

    /// Whether the line opts out of earning for `program`.
    #[inline]
    pub fn ignores_loyalty_points(&self, program: &Program) -> bool {
        self.ignored_program_ids.contains(&program.id)
    }
}

// =============================================================================
// Award
// =============================================================================

/// One unit of calculator output.
///
/// ## JSON Shape
/// ```json
/// { "points": 1.0 }
/// { "points": 25.0, "barcode": "044123", "giftCardId": "gc-7" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    #[ts(type = "number")]
    pub points: Points,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub barcode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub gift_card_id: Option<String>,
}

impl Award {
    pub fn new(points: Points) -> Self {
        Award {
            points,
            barcode: None,
            gift_card_id: None,
        }
    }

    /// Award tagged with the gift card it funds.
    pub fn for_gift_card(points: Points, link: &GiftCardLink) -> Self {
        Award {
            points,
            barcode: Some(link.barcode.clone()),
            gift_card_id: Some(link.card_id.clone()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
