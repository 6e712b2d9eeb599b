// ============================================================================
// Market Errors
// ============================================================================

use super::order::state::OrderStatus;
use super::order::{ItemId, OrderId, OwnerId};
use thiserror::Error;

/// Errors returned by book and registry operations.
///
/// All of these are recoverable by the caller. Broken internal invariants are not
/// represented here; they are bugs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("the market is closed")]
    MarketClosed,

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("order {order_id} is {status:?} and cannot be cancelled")]
    NotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error("item {0} is not traded on this market")]
    UnknownItem(ItemId),

    #[error("participant {0} is restricted from trading")]
    Restricted(OwnerId),

    #[error("corrupt record: {0}")]
    CorruptRecord(String),
}

pub type MarketResult<T> = Result<T, MarketError>;

/// Errors raised while validating or loading a [`MarketConfig`](super::MarketConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("catalog cannot be empty")]
    EmptyCatalog,

    #[error("tick size must be positive")]
    NonPositiveTickSize,

    #[error("maximum order volume must be positive")]
    ZeroMaxOrderVolume,

    #[error("could not parse configuration: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(MarketError::MarketClosed.to_string(), "the market is closed");
        assert_eq!(
            MarketError::InvalidOrder("volume must be positive".to_string()).to_string(),
            "invalid order: volume must be positive"
        );
        assert_eq!(
            ConfigError::EmptyCatalog.to_string(),
            "catalog cannot be empty"
        );
    }

    #[test]
    fn test_error_equality() {
        let id = OrderId::new();
        assert_eq!(MarketError::NotFound(id), MarketError::NotFound(id));
        assert_ne!(MarketError::NotFound(id), MarketError::MarketClosed);
    }
}
