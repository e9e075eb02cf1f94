//! # Point Expiry
//!
//! Decides when loyalty card balances expire, on caller-supplied snapshots.
//! Persisting the changes (and scheduling the sweeps) is the caller's job.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Card Balance Lifecycle                             │
//! │                                                                         │
//! │  points added ──► expiration = now + validity (6 months by default)    │
//! │       │                                                                 │
//! │  order paid ────► expiration = order date + validity                   │
//! │       │                                                                 │
//! │  daily sweep ───► expiration <= now and points > 0                     │
//! │                     → points = 0, issued history reset                 │
//! │                                                                         │
//! │  program sweep ─► program.points_expiry_date <= now                    │
//! │                     → every card of the program = 0                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::points::Points;

// =============================================================================
// Snapshots
// =============================================================================

/// A customer's balance in one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoyaltyCard {
    pub id: String,
    pub program_id: String,
    pub partner_id: Option<String>,
    #[ts(type = "number")]
    pub points: Points,
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<DateTime<Utc>>,
}

impl LoyaltyCard {
    fn has_balance(&self) -> bool {
        !self.points.is_zero() && !self.points.is_negative()
    }
}

/// A history row recording points issued to a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub card_id: String,
    pub issued: Points,
}

/// Program-wide expiry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramExpiry {
    pub program_id: String,
    /// All balances of the program drop to zero once this is reached.
    pub points_expiry_date: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// =============================================================================
// Expiration Dates
// =============================================================================

/// `from` plus `validity_months`, `None` if out of chrono's range.
pub fn expiration_from(from: DateTime<Utc>, validity_months: u32) -> Option<DateTime<Utc>> {
    from.checked_add_months(Months::new(validity_months))
}

/// Pushes the expiration of a positive balance out to `now + validity`.
///
/// Cards without a positive balance keep whatever date they had.
pub fn refresh_expiration(card: &mut LoyaltyCard, now: DateTime<Utc>, validity_months: u32) {
    if card.has_balance() {
        card.expiration_date = expiration_from(now, validity_months);
    }
}

/// Refreshes every positive-balance card of `partner_id` after a paid order.
///
/// Returns the number of cards updated.
pub fn refresh_after_order(
    cards: &mut [LoyaltyCard],
    partner_id: &str,
    order_date: DateTime<Utc>,
    validity_months: u32,
) -> usize {
    let expiration = expiration_from(order_date, validity_months);
    let mut updated = 0;

    for card in cards
        .iter_mut()
        .filter(|c| c.partner_id.as_deref() == Some(partner_id) && c.has_balance())
    {
        card.expiration_date = expiration;
        updated += 1;
    }

    debug!(partner_id, updated, "Refreshed card expiration after order");
    updated
}

// =============================================================================
// Sweeps
// =============================================================================

fn reset_issued(history: &mut [HistoryEntry], card_id: &str) {
    for entry in history
        .iter_mut()
        .filter(|h| h.card_id == card_id && !h.issued.is_zero() && !h.issued.is_negative())
    {
        entry.issued = Points::zero();
    }
}

/// Zeroes every positive balance whose expiration has passed.
///
/// Returns the number of expired cards.
pub fn expire_cards(
    cards: &mut [LoyaltyCard],
    history: &mut [HistoryEntry],
    now: DateTime<Utc>,
) -> usize {
    let mut expired = 0;

    for card in cards.iter_mut() {
        let due = card.expiration_date.is_some_and(|date| date <= now);
        if !due || !card.has_balance() {
            continue;
        }

        debug!(card_id = %card.id, points = %card.points, "Expiring card points");
        card.points = Points::zero();
        reset_issued(history, &card.id);
        expired += 1;
    }

    if expired > 0 {
        info!(expired, "Expired loyalty card balances");
    }
    expired
}

/// Zeroes every card of each active program whose expiry date has passed.
///
/// Returns the number of cards reset.
pub fn expire_program_points(
    programs: &[ProgramExpiry],
    cards: &mut [LoyaltyCard],
    history: &mut [HistoryEntry],
    now: DateTime<Utc>,
) -> usize {
    let expired_programs: Vec<&str> = programs
        .iter()
        .filter(|p| p.active && p.points_expiry_date.is_some_and(|date| date <= now))
        .map(|p| p.program_id.as_str())
        .collect();

    if expired_programs.is_empty() {
        return 0;
    }

    let mut reset = 0;
    for card in cards
        .iter_mut()
        .filter(|c| expired_programs.contains(&c.program_id.as_str()))
    {
        card.points = Points::zero();
        reset_issued(history, &card.id);
        reset += 1;
    }

    info!(programs = ?expired_programs, reset, "Expired program points");
    reset
}

// =============================================================================
// Unit Tests
// =============================================================================
