// ============================================================================
// Market Gate
// Process-wide open/closed admission flag shared by every book
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MarketGate(Arc<AtomicBool>);

impl MarketGate {
    pub fn new(open: bool) -> Self {
        Self(Arc::new(AtomicBool::new(open)))
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Returns true if the gate was closed before.
    pub fn open(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    /// Returns true if the gate was open before.
    pub fn close(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl Default for MarketGate {
    fn default() -> Self {
        Self::new(true)
    }
}
