// ============================================================================
// Engine Module
// Contains the core matching engine business logic
// ============================================================================

mod gate;
mod order_book;
mod price_time;
mod registry;

pub mod factory;

pub use factory::{create_from_config, MarketRegistryBuilder};
pub use gate::MarketGate;
pub use order_book::{BookContext, OrderBook, Submission};
pub use price_time::PriceTimePriority;
pub use registry::MarketRegistry;
