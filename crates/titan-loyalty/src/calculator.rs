//! # Points Calculator
//!
//! Computes the loyalty point awards an order earns for each candidate
//! program. Purchases earn, returns (negative quantities) deduct.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       points_for_programs()                             │
//! │                                                                         │
//! │  1. validate lines ──► no product / out-of-range? → InvalidOrderLine   │
//! │                                                                         │
//! │  2. index lines per rule (for the minimum amount check)                │
//! │     • skip auto-triggered discount lines                               │
//! │     • skip a program's own discount lines                              │
//! │                                                                         │
//! │  3. for program in programs, for rule in program.rules:                │
//! │       code required but not entered?     → skip                        │
//! │       |amount| < minimum_amount?          → skip                        │
//! │       aggregate qty / paid over lines                                  │
//! │       |qty| < minimum_qty?                → skip                        │
//! │       record rule as counted                                           │
//! │       split?  ──yes──► one Award per unit (sign in value, not count)   │
//! │         │                                                               │
//! │         no ──► add to the program's lump sum                           │
//! │                                                                         │
//! │  4. lump sum != 0 or coupons program → first Award = lump sum          │
//! │     then the split Awards, in rule order                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why Absolute Values?
//! Minimums were designed for purchases. A return of $50 against a rule with
//! a $40 minimum must still reverse the points that rule granted, so both
//! thresholds compare magnitudes while the sign flows into the points.
//!
//! ## Example
//! ```rust
//! use titan_loyalty::calculator::{points_for_programs, CalculationContext};
//! use titan_loyalty::types::{OrderLine, Program, RewardPointMode, Rule};
//!
//! let program = Program {
//!     id: "loyalty".to_string(),
//!     rules: vec![Rule {
//!         id: "per-unit".to_string(),
//!         any_product: true,
//!         reward_point_mode: RewardPointMode::Unit,
//!         reward_point_amount: 10.0,
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//! let refund = OrderLine {
//!     id: "L1".to_string(),
//!     product_id: Some("mug".to_string()),
//!     quantity: -3.0,
//!     price_with_tax: -36.0,
//!     price_without_tax: -30.0,
//!     ..Default::default()
//! };
//!
//! let result = points_for_programs(&[refund], &[program], &CalculationContext::default()).unwrap();
//! let awards = result.awards_for("loyalty").unwrap();
//! assert_eq!(awards.len(), 1);
//! assert_eq!(awards[0].points.to_f64(), -30.0);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::iter;

use rust_decimal::prelude::*;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::LoyaltyConfig;
use crate::error::{LoyaltyError, LoyaltyResult, ValidationError};
use crate::points::{to_decimal, Points, Rounding};
use crate::types::{
    AppliesOn, Award, MinimumAmountTaxMode, OrderLine, Program, ProgramType, RewardPointMode,
    RewardRef, RewardType, Rule,
};
use crate::validation::validate_order_lines;

/// Rounding of money-based points on the POS.
///
/// The back-office sales flow rounds half-down instead. Both are kept as-is.
pub const POS_MONEY_ROUNDING: Rounding = Rounding::HalfUp;

/// A validated line and the product it was validated with.
type ValidLine<'a> = (&'a OrderLine, &'a str);

// =============================================================================
// Calculation Context
// =============================================================================

/// Order-level inputs that are not part of the lines or programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationContext {
    /// Rules unlocked by codes entered on this order.
    pub activated_rule_ids: HashSet<String>,

    /// Decimal places kept by money-based rules.
    pub points_decimals: u32,
}

impl Default for CalculationContext {
    fn default() -> Self {
        CalculationContext {
            activated_rule_ids: HashSet::new(),
            points_decimals: crate::DEFAULT_POINTS_DECIMALS,
        }
    }
}

impl CalculationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context using the configured precision.
    pub fn from_config(config: &LoyaltyConfig) -> Self {
        CalculationContext {
            points_decimals: config.points.decimals,
            ..Self::default()
        }
    }

    /// Marks a code-activated rule as unlocked.
    pub fn with_activated_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.activated_rule_ids.insert(rule_id.into());
        self
    }
}

// =============================================================================
// Output Types
// =============================================================================

/// A rule that passed every gate, with the aggregates it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleApplication {
    pub rule_id: String,
    /// Net quantity of purchased (non-reward) lines.
    pub total_product_qty: Decimal,
    /// Net tax-inclusive amount, reward lines included.
    pub ordered_product_paid: Decimal,
    /// Net quantity per product (reward lines under the product they replace).
    pub qty_per_product: BTreeMap<String, Decimal>,
    /// Whether the rule produced per-unit awards.
    pub split: bool,
}

/// Result for one program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramPoints {
    pub program_id: String,
    pub awards: Vec<Award>,
    pub counted_rules: Vec<RuleApplication>,
}

/// Result for every candidate program, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointsCalculation {
    pub programs: Vec<ProgramPoints>,
}

impl PointsCalculation {
    fn find(&self, program_id: &str) -> Option<&ProgramPoints> {
        self.programs.iter().rev().find(|p| p.program_id == program_id)
    }

    /// Awards for a program, `None` if it was not a candidate.
    pub fn awards_for(&self, program_id: &str) -> Option<&[Award]> {
        self.find(program_id).map(|p| p.awards.as_slice())
    }

    /// Rules counted for a program.
    pub fn counted_rules(&self, program_id: &str) -> Option<&[RuleApplication]> {
        self.find(program_id).map(|p| p.counted_rules.as_slice())
    }

    /// Sum of every award of a program.
    pub fn total_points(&self, program_id: &str) -> Points {
        self.awards_for(program_id)
            .unwrap_or_default()
            .iter()
            .fold(Points::zero(), |acc, award| acc + award.points)
    }

    /// Program id → awards. A program listed twice keeps its last result.
    pub fn into_award_map(self) -> HashMap<String, Vec<Award>> {
        self.programs
            .into_iter()
            .map(|p| (p.program_id, p.awards))
            .collect()
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Computes the awards `lines` earn for each of `programs`.
///
/// Pure and deterministic: same inputs, same output.
///
/// ## Errors
/// - [`LoyaltyError::InvalidOrderLine`] when a line has no product, carries
///   numbers outside `Decimal` range, or overflows the sums it feeds
/// - [`LoyaltyError::PointsOverflow`] when a rule's points leave that range
///
/// Ordinary rule configuration never causes an error.
pub fn points_for_programs(
    lines: &[OrderLine],
    programs: &[Program],
    ctx: &CalculationContext,
) -> LoyaltyResult<PointsCalculation> {
    let lines = validate_order_lines(lines)?;
    let lines_per_rule = index_lines_per_rule(&lines, programs);

    let programs = programs
        .iter()
        .map(|program| evaluate_program(program, &lines, &lines_per_rule, ctx))
        .collect::<LoyaltyResult<_>>()?;

    Ok(PointsCalculation { programs })
}

// =============================================================================
// Exclusions
// =============================================================================

/// Reward lines that must not earn points for `program`.
///
/// A reward bought with this program's own points would otherwise earn
/// points again, and gift card / e-wallet rewards are money, not purchases.
pub fn is_feedback_reward_line(line: &OrderLine, program: &Program) -> bool {
    line.reward.as_ref().is_some_and(|reward| {
        reward.program.id == program.id || reward.program.program_type.is_wallet_like()
    })
}

fn line_overflow(line: &OrderLine, field: &str) -> LoyaltyError {
    LoyaltyError::InvalidOrderLine {
        line_id: line.id.clone(),
        source: ValidationError::Overflow {
            field: field.to_string(),
        },
    }
}

fn rule_overflow(program: &Program, rule: &Rule) -> LoyaltyError {
    LoyaltyError::PointsOverflow {
        program_id: program.id.clone(),
        rule_id: rule.id.clone(),
    }
}

fn discount_reward(line: &OrderLine) -> Option<&RewardRef> {
    line.reward
        .as_ref()
        .filter(|reward| reward.reward_type == RewardType::Discount)
}

// =============================================================================
// Rule Index
// =============================================================================

/// Lines counted towards each rule's minimum amount, keyed by rule id.
fn index_lines_per_rule<'a>(
    lines: &[ValidLine<'a>],
    programs: &'a [Program],
) -> HashMap<&'a str, Vec<&'a OrderLine>> {
    let mut index: HashMap<&str, Vec<&OrderLine>> = HashMap::new();

    for &(line, product_id) in lines {
        let discount = discount_reward(line);
        if discount.is_some_and(RewardRef::is_auto_discount) {
            continue;
        }

        for program in programs {
            if discount.is_some_and(|reward| reward.program.id == program.id) {
                continue;
            }
            for rule in program.rules.iter().filter(|rule| rule.applies_to(product_id)) {
                index.entry(rule.id.as_str()).or_default().push(line);
            }
        }
    }

    index
}

// =============================================================================
// Program Evaluation
// =============================================================================

fn evaluate_program(
    program: &Program,
    lines: &[ValidLine<'_>],
    lines_per_rule: &HashMap<&str, Vec<&OrderLine>>,
    ctx: &CalculationContext,
) -> LoyaltyResult<ProgramPoints> {
    let mut points = Points::zero();
    let mut split_awards = Vec::new();
    let mut counted_rules = Vec::new();

    for rule in &program.rules {
        if !rule.is_active(&ctx.activated_rule_ids) {
            trace!(program_id = %program.id, rule_id = %rule.id, "Rule code not entered");
            continue;
        }

        let rule_lines = lines_per_rule
            .get(rule.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let amount = minimum_amount_basis(rule, rule_lines)?;
        if to_decimal(rule.minimum_amount) > amount.abs() {
            debug!(
                program_id = %program.id,
                rule_id = %rule.id,
                amount = %amount,
                minimum = rule.minimum_amount,
                "Rule minimum amount not reached"
            );
            continue;
        }

        let totals = aggregate(program, rule, lines)?;
        if totals.total_product_qty.abs() < to_decimal(rule.minimum_qty) {
            debug!(
                program_id = %program.id,
                rule_id = %rule.id,
                qty = %totals.total_product_qty,
                minimum = rule.minimum_qty,
                "Rule minimum quantity not reached"
            );
            continue;
        }

        let split = is_split(program, rule);
        if split {
            match rule.reward_point_mode {
                RewardPointMode::Unit => {
                    let awards = split_per_unit(rule, &totals)
                        .ok_or_else(|| rule_overflow(program, rule))?;
                    split_awards.extend(awards);
                }
                RewardPointMode::Money => {
                    split_awards.extend(split_per_money(program, rule, lines, ctx.points_decimals)?)
                }
                _ => {}
            }
        } else {
            points = lump_sum(rule, &totals, ctx.points_decimals)
                .and_then(|earned| points.checked_add(earned))
                .ok_or_else(|| rule_overflow(program, rule))?;
        }

        debug!(program_id = %program.id, rule_id = %rule.id, split, "Rule counted");
        counted_rules.push(totals.into_application(rule, split));
    }

    let mut awards = Vec::with_capacity(split_awards.len() + 1);
    if !points.is_zero() || program.program_type == ProgramType::Coupons {
        awards.push(Award::new(points));
    }
    awards.extend(split_awards);

    Ok(ProgramPoints {
        program_id: program.id.clone(),
        awards,
        counted_rules,
    })
}

/// Amount compared against `rule.minimum_amount`, signed.
fn minimum_amount_basis(rule: &Rule, rule_lines: &[&OrderLine]) -> LoyaltyResult<Decimal> {
    let mut with_tax = Decimal::ZERO;
    let mut without_tax = Decimal::ZERO;

    for line in rule_lines {
        with_tax = with_tax
            .checked_add(to_decimal(line.price_with_tax))
            .ok_or_else(|| line_overflow(line, "price_with_tax"))?;
        without_tax = without_tax
            .checked_add(to_decimal(line.price_without_tax))
            .ok_or_else(|| line_overflow(line, "price_without_tax"))?;
    }

    match rule.minimum_amount_tax_mode {
        // A zero tax-inclusive total falls through to the exclusive one.
        MinimumAmountTaxMode::Incl if !with_tax.is_zero() => Ok(with_tax),
        _ => Ok(without_tax),
    }
}

fn is_split(program: &Program, rule: &Rule) -> bool {
    program.applies_on == AppliesOn::Future
        && rule.reward_point_split
        && rule.reward_point_mode != RewardPointMode::Order
}

// =============================================================================
// Aggregation
// =============================================================================

#[derive(Debug, Default)]
struct RuleTotals {
    total_product_qty: Decimal,
    ordered_product_paid: Decimal,
    qty_per_product: BTreeMap<String, Decimal>,
}

impl RuleTotals {
    fn into_application(self, rule: &Rule, split: bool) -> RuleApplication {
        RuleApplication {
            rule_id: rule.id.clone(),
            total_product_qty: self.total_product_qty,
            ordered_product_paid: self.ordered_product_paid,
            qty_per_product: self.qty_per_product,
            split,
        }
    }
}

/// Sums the lines `rule` earns on for `program`.
///
/// Reward lines match on the product they replace and count with inverted
/// sign; they add to the amount paid but never to `total_product_qty`.
fn aggregate(
    program: &Program,
    rule: &Rule,
    lines: &[ValidLine<'_>],
) -> LoyaltyResult<RuleTotals> {
    let mut totals = RuleTotals::default();

    for &(line, product_id) in lines {
        let target = line.reward_product_id.as_deref().unwrap_or(product_id);
        if !rule.applies_to(target) || line.ignores_loyalty_points(program) {
            continue;
        }
        if is_feedback_reward_line(line, program) {
            trace!(program_id = %program.id, line_id = %line.id, "Skipping feedback reward line");
            continue;
        }

        let qty = to_decimal(line.quantity);
        let line_qty = if line.reward_product_id.is_some() { -qty } else { qty };

        let product_qty = totals.qty_per_product.entry(target.to_string()).or_default();
        *product_qty = product_qty
            .checked_add(line_qty)
            .ok_or_else(|| line_overflow(line, "quantity"))?;
        totals.ordered_product_paid = totals
            .ordered_product_paid
            .checked_add(to_decimal(line.price_with_tax))
            .ok_or_else(|| line_overflow(line, "price_with_tax"))?;
        if !line.is_reward_line() {
            totals.total_product_qty = totals
                .total_product_qty
                .checked_add(line_qty)
                .ok_or_else(|| line_overflow(line, "quantity"))?;
        }
    }

    Ok(totals)
}

// =============================================================================
// Earning
// =============================================================================

/// Points a non-split rule adds to the lump sum, `None` on overflow.
fn lump_sum(rule: &Rule, totals: &RuleTotals, decimals: u32) -> Option<Points> {
    let amount = Points::from_f64(rule.reward_point_amount);

    match rule.reward_point_mode {
        RewardPointMode::Order => Some(amount),
        RewardPointMode::Money => amount
            .checked_mul(totals.ordered_product_paid)
            .map(|earned| earned.round(decimals, POS_MONEY_ROUNDING)),
        RewardPointMode::Unit => amount.checked_mul(totals.total_product_qty),
        RewardPointMode::Unknown => {
            debug!(rule_id = %rule.id, "Unrecognized reward point mode earns nothing");
            Some(Points::zero())
        }
    }
}

/// Whole units in a signed quantity. Fractions of a unit earn no split award.
///
/// `None` when the count does not fit `usize`.
fn unit_count(qty: Decimal) -> Option<usize> {
    qty.abs().trunc().to_usize()
}

fn sign_of(qty: Decimal) -> Decimal {
    if qty.is_sign_negative() && !qty.is_zero() {
        Decimal::NEGATIVE_ONE
    } else {
        Decimal::ONE
    }
}

/// `|qty|` awards of `±amount`. The sign lives in the value, never the count.
fn split_per_unit(rule: &Rule, totals: &RuleTotals) -> Option<impl Iterator<Item = Award>> {
    let each = Points::from_f64(rule.reward_point_amount) * sign_of(totals.total_product_qty);
    let count = unit_count(totals.total_product_qty)?;
    Some(iter::repeat(Award::new(each)).take(count))
}

/// Per-line, per-unit money awards. Single-unit gift card lines are tagged
/// with their card so the caller can fund it.
///
/// Each award is `rate × price / |qty| × sign(qty)`. The price of a return
/// is already negative, so a return line ends up with positive awards.
fn split_per_money(
    program: &Program,
    rule: &Rule,
    lines: &[ValidLine<'_>],
    decimals: u32,
) -> LoyaltyResult<Vec<Award>> {
    let rate = to_decimal(rule.reward_point_amount);
    let mut awards = Vec::new();

    for &(line, product_id) in lines {
        if line.is_reward_line()
            || !rule.applies_to(product_id)
            || line.ignores_loyalty_points(program)
        {
            continue;
        }

        let qty = to_decimal(line.quantity);
        if qty.is_zero() {
            continue;
        }

        let per_unit = rate
            .checked_mul(to_decimal(line.price_with_tax))
            .and_then(|paid| paid.checked_div(qty.abs()))
            .map(|each| Points::new(each).round(decimals, POS_MONEY_ROUNDING))
            .ok_or_else(|| line_overflow(line, "price_with_tax"))?;
        let value = per_unit * sign_of(qty);
        if value.is_zero() {
            continue;
        }

        let count = unit_count(qty).ok_or_else(|| line_overflow(line, "quantity"))?;
        let award = match &line.gift_card {
            Some(link) if count == 1 => Award::for_gift_card(value, link),
            _ => Award::new(value),
        };
        awards.extend(iter::repeat(award).take(count));
    }

    Ok(awards)
}

// =============================================================================
// Unit Tests
// =============================================================================
