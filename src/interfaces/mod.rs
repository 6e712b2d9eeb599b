// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod event_handler;
mod matching_algorithm;
mod profile_ledger;

pub use event_handler::{
    BufferedEventHandler, EventHandler, LoggingEventHandler, MarketEvent, NoOpEventHandler,
};
pub use matching_algorithm::MatchingAlgorithm;
pub use profile_ledger::{AdmissionCheck, LedgerEvent, NoOpLedger, ProfileLedger};
