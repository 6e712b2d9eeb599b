// ============================================================================
// Utilities Module
// Helpers for hosting the engine
// ============================================================================

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "logging")]
pub use logging::init_tracing;
