// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod book_side;
pub mod config;
pub mod errors;
pub mod order;
pub mod records;
pub mod sequence;
pub mod settlement;
pub mod stats;
pub mod trade;

pub use book_side::{OrderBookSide, OrderBookSnapshot, PriceQuote, PriorityKey, RestingEntry};
pub use config::{MarketConfig, OrderRules};
pub use errors::{ConfigError, MarketError, MarketResult};
pub use order::{
    ItemId, Order, OrderId, OrderKind, OrderRequest, OrderTrades, OwnerId, Price, Side, Volume,
};
pub use records::{BookRecord, OrderRecord, TradeRecord};
pub use sequence::Sequencer;
pub use settlement::{Refund, Settlement};
pub use stats::BookStats;
pub use trade::{Trade, TradeId};

// Re-export state machine
pub use order::state::{OrderStatus, OrderTransition};
