// ============================================================================
// Market Registry Factory
// Creates market registries with proper configuration
// ============================================================================

use crate::domain::{ConfigError, ItemId, MarketConfig, Price, Sequencer, Volume};
use crate::engine::{BookContext, MarketGate, MarketRegistry, PriceTimePriority};
use crate::interfaces::{AdmissionCheck, EventHandler, MatchingAlgorithm, NoOpEventHandler, NoOpLedger, ProfileLedger};
use crate::ledger::InMemoryProfileLedger;
use std::sync::Arc;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a market registry from configuration
///
/// # Arguments
/// * `config` - Market configuration
/// * `event_handler` - Event handler for order and trade events
///
/// # Example
/// ```
/// use market_engine::prelude::*;
/// use market_engine::engine::factory::create_from_config;
/// use std::sync::Arc;
///
/// let config = MarketConfig::whole_coin_catalog(["wheat", "iron"]);
/// let market = create_from_config(config, Arc::new(NoOpEventHandler)).unwrap();
/// assert!(market.is_open());
/// ```
pub fn create_from_config(
    config: MarketConfig,
    event_handler: Arc<dyn EventHandler>,
) -> Result<MarketRegistry, ConfigError> {
    MarketRegistryBuilder::new()
        .with_config(config)
        .with_event_handler(event_handler)
        .build()
}

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating market registries with fluent API
///
/// # Example
/// ```
/// use market_engine::prelude::*;
/// use market_engine::engine::factory::MarketRegistryBuilder;
/// use std::sync::Arc;
///
/// let profiles = Arc::new(InMemoryProfileLedger::new());
/// let market = MarketRegistryBuilder::new()
///     .with_catalog(["diamond", "emerald"])
///     .with_max_order_volume(2304)
///     .with_profiles(profiles)
///     .with_event_handler(Arc::new(LoggingEventHandler))
///     .build()
///     .unwrap();
///
/// assert!(market.book_for(&ItemId::from("diamond")).is_ok());
/// ```
pub struct MarketRegistryBuilder {
    config: MarketConfig,
    algorithm: Arc<dyn MatchingAlgorithm>,
    events: Arc<dyn EventHandler>,
    ledger: Arc<dyn ProfileLedger>,
    admission: Option<Arc<dyn AdmissionCheck>>,
}

impl Default for MarketRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketRegistryBuilder {
    pub fn new() -> Self {
        Self {
            config: MarketConfig::default(),
            algorithm: Arc::new(PriceTimePriority::new()),
            events: Arc::new(NoOpEventHandler),
            ledger: Arc::new(NoOpLedger),
            admission: None,
        }
    }

    // ========================================================================
    // Market Configuration
    // ========================================================================

    /// Replace the whole configuration
    pub fn with_config(mut self, config: MarketConfig) -> Self {
        self.config = config;
        self
    }

    /// Start with the admission gate closed
    pub fn closed_on_start(mut self) -> Self {
        self.config = self.config.closed_on_start();
        self
    }

    /// Restrict trading to a fixed set of items
    pub fn with_catalog<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        self.config = self.config.with_catalog(items);
        self
    }

    /// Cap the volume of a single order
    pub fn with_max_order_volume(mut self, volume: Volume) -> Self {
        self.config = self.config.with_max_order_volume(volume);
        self
    }

    /// Set price tick size
    pub fn with_tick_size(mut self, tick_size: Price) -> Self {
        self.config = self.config.with_tick_size(tick_size);
        self
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    /// Replace the matching algorithm (price-time priority by default)
    pub fn with_algorithm(mut self, algorithm: Arc<dyn MatchingAlgorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_event_handler(mut self, events: Arc<dyn EventHandler>) -> Self {
        self.events = events;
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn ProfileLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn with_admission_check(mut self, admission: Arc<dyn AdmissionCheck>) -> Self {
        self.admission = Some(admission);
        self
    }

    /// Use one in-memory ledger both for statistics and for trading restrictions
    pub fn with_profiles(self, profiles: Arc<InMemoryProfileLedger>) -> Self {
        self.with_ledger(profiles.clone()).with_admission_check(profiles)
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Validate the configuration and build the registry
    pub fn build(self) -> Result<MarketRegistry, ConfigError> {
        self.config.validate()?;

        let context = BookContext {
            gate: MarketGate::new(self.config.open_on_start),
            order_sequence: Sequencer::new(),
            trade_sequence: Sequencer::new(),
            rules: self.config.order_rules(),
            events: self.events,
            ledger: self.ledger,
        };

        Ok(MarketRegistry::from_parts(
            self.config,
            self.algorithm,
            context,
            self.admission,
        ))
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &MarketConfig {
        &self.config
    }
}
