// ============================================================================
// Market Configuration
// Admission gate, item catalog and per-order limits
// ============================================================================

use rust_decimal::Decimal;
use std::collections::HashSet;

use super::errors::ConfigError;
use super::order::{ItemId, Price, Volume};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Order Rules
// ============================================================================

/// Limits every book applies to incoming orders on top of the basic
/// positive-volume / positive-price checks.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderRules {
    /// Largest volume a single order may request
    pub max_order_volume: Option<Volume>,
    /// Limit prices must be a multiple of this
    pub tick_size: Option<Price>,
}

// ============================================================================
// Market Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MarketConfig {
    /// Whether the admission gate starts open
    pub open_on_start: bool,

    /// Tradable items. None means any item gets a book on first use.
    pub catalog: Option<HashSet<ItemId>>,

    /// Optional: largest volume of a single order
    pub max_order_volume: Option<Volume>,

    /// Optional: price tick size (minimum price increment)
    pub tick_size: Option<Price>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            open_on_start: true,
            catalog: None,
            max_order_volume: None,
            tick_size: None,
        }
    }
}

impl MarketConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: Start with the admission gate closed
    pub fn closed_on_start(mut self) -> Self {
        self.open_on_start = false;
        self
    }

    /// Builder method: Restrict trading to a fixed set of items
    pub fn with_catalog<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        self.catalog = Some(items.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method: Cap the volume of a single order
    pub fn with_max_order_volume(mut self, volume: Volume) -> Self {
        self.max_order_volume = Some(volume);
        self
    }

    /// Builder method: Set price tick size
    pub fn with_tick_size(mut self, tick: Price) -> Self {
        self.tick_size = Some(tick);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(catalog) = &self.catalog {
            if catalog.is_empty() {
                return Err(ConfigError::EmptyCatalog);
            }
        }

        if let Some(tick) = self.tick_size {
            if tick <= Decimal::ZERO {
                return Err(ConfigError::NonPositiveTickSize);
            }
        }

        if self.max_order_volume == Some(0) {
            return Err(ConfigError::ZeroMaxOrderVolume);
        }

        Ok(())
    }

    /// Whether `item` may have a book.
    pub fn allows(&self, item: &ItemId) -> bool {
        self.catalog
            .as_ref()
            .map(|catalog| catalog.contains(item))
            .unwrap_or(true)
    }

    pub fn order_rules(&self) -> OrderRules {
        OrderRules {
            max_order_volume: self.max_order_volume,
            tick_size: self.tick_size,
        }
    }

    /// Parse and validate a JSON configuration.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Preset Configurations
// ============================================================================

impl MarketConfig {
    /// Whole-unit prices over a fixed catalog, gate open.
    pub fn whole_coin_catalog<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        Self::new()
            .with_catalog(items)
            .with_tick_size(Decimal::ONE)
    }
}
