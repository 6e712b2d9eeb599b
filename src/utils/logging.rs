// ============================================================================
// Logging Setup
// ============================================================================

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install a global fmt subscriber at `level`.
///
/// Fails if another global subscriber is already set, which happens when the host
/// application configures its own logging first.
pub fn init_tracing(level: Level) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .try_init()
}
