//! # Loyalty Configuration
//!
//! Tunables for the loyalty core.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TITAN_LOYALTY_POINTS_DECIMALS=2                                    │
//! │     TITAN_LOYALTY_CARD_VALIDITY_MONTHS=6                               │
//! │                                                                         │
//! │  2. TOML Config File (path supplied by the host app)                   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     2 decimals, 6 months                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # loyalty.toml
//! [points]
//! decimals = 2
//!
//! [cards]
//! validity_months = 6
//! ```
//!
//! The calculator itself never reads this; hosts turn it into a
//! [`crate::calculator::CalculationContext`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{LoyaltyError, LoyaltyResult};

/// Upper bound for point precision.
pub const MAX_POINTS_DECIMALS: u32 = 10;

// =============================================================================
// Points Settings
// =============================================================================

/// Rounding precision of computed points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsSettings {
    /// Decimal places kept by money-based rules.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    crate::DEFAULT_POINTS_DECIMALS
}

impl Default for PointsSettings {
    fn default() -> Self {
        PointsSettings {
            decimals: default_decimals(),
        }
    }
}

// =============================================================================
// Card Settings
// =============================================================================

/// Loyalty card balance lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSettings {
    /// Months a positive balance stays valid after it last changed.
    #[serde(default = "default_validity_months")]
    pub validity_months: u32,
}

fn default_validity_months() -> u32 {
    crate::DEFAULT_CARD_VALIDITY_MONTHS
}

impl Default for CardSettings {
    fn default() -> Self {
        CardSettings {
            validity_months: default_validity_months(),
        }
    }
}

// =============================================================================
// Main Loyalty Configuration
// =============================================================================

/// Complete loyalty configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    #[serde(default)]
    pub points: PointsSettings,

    #[serde(default)]
    pub cards: CardSettings,
}

impl LoyaltyConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(contents: &str) -> LoyaltyResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (if given and present)
    /// 3. Environment variables
    pub fn load(config_path: Option<&Path>) -> LoyaltyResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            if path.exists() {
                info!(?path, "Loading loyalty config from file");
                let contents = std::fs::read_to_string(path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<&Path>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load loyalty config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LoyaltyResult<()> {
        if self.points.decimals > MAX_POINTS_DECIMALS {
            return Err(LoyaltyError::InvalidConfig(format!(
                "points.decimals must be at most {}, got {}",
                MAX_POINTS_DECIMALS, self.points.decimals
            )));
        }

        if self.cards.validity_months == 0 {
            return Err(LoyaltyError::InvalidConfig(
                "cards.validity_months must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `TITAN_LOYALTY_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("TITAN_LOYALTY_POINTS_DECIMALS") {
            match value.parse::<u32>() {
                Ok(decimals) => {
                    debug!(decimals, "Overriding points decimals from environment");
                    self.points.decimals = decimals;
                }
                Err(_) => warn!(value = %value, "Ignoring invalid TITAN_LOYALTY_POINTS_DECIMALS"),
            }
        }

        if let Some(value) = lookup("TITAN_LOYALTY_CARD_VALIDITY_MONTHS") {
            match value.parse::<u32>() {
                Ok(months) => {
                    debug!(months, "Overriding card validity from environment");
                    self.cards.validity_months = months;
                }
                Err(_) => {
                    warn!(value = %value, "Ignoring invalid TITAN_LOYALTY_CARD_VALIDITY_MONTHS")
                }
            }
        }
    }
}
