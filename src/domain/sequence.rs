// ============================================================================
// Sequencer
// Shared monotonic counter for order priority and trade ordering
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cloning shares the counter, so every book handed the same sequencer draws
/// from one global sequence.
#[derive(Debug, Clone, Default)]
pub struct Sequencer(Arc<AtomicU64>);

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next value; the first call returns 1.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Make sure future values are greater than `value` (used after a reload).
    pub fn advance_to(&self, value: u64) {
        self.0.fetch_max(value, Ordering::AcqRel);
    }
}
