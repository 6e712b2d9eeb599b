// ============================================================================
// Ledger Module
// Profile ledger implementations
// ============================================================================

mod profile;

pub use profile::{InMemoryProfileLedger, MarketProfile};
