// ============================================================================
// Matching Algorithm Interface
// Defines the contract for the book's matching strategy
// ============================================================================

use crate::domain::{Order, OrderBookSide, OrderId, Price, Sequencer, Side, Trade};
use std::collections::HashMap;
use std::sync::Arc;

/// Strategy pattern interface for matching algorithms.
///
/// Called with the owning book's lock held. Implementations fill `incoming` against
/// `opposite`, update the resting orders in `orders`, and remove resting entries that
/// reach zero. They never rest or cancel the incoming order; the book decides that.
pub trait MatchingAlgorithm: Send + Sync {
    /// Match an incoming order against the opposite side of the book
    ///
    /// # Arguments
    /// * `incoming` - The new order to match
    /// * `opposite` - The opposite side of the order book
    /// * `orders` - Every order of the book, by id
    /// * `trade_sequence` - Source of trade sequence numbers
    ///
    /// # Returns
    /// Trades generated from matching, in execution order
    fn match_order(
        &self,
        incoming: &mut Order,
        opposite: &OrderBookSide,
        orders: &mut HashMap<OrderId, Order>,
        trade_sequence: &Sequencer,
    ) -> Vec<Arc<Trade>>;

    /// Get the algorithm name for logging
    fn name(&self) -> &str;

    /// Check if an incoming order crosses a resting price.
    /// Market orders cross anything.
    fn prices_cross(&self, incoming: &Order, resting_price: Price) -> bool {
        match incoming.limit_price {
            None => true,
            Some(limit) => match incoming.side {
                Side::Buy => limit >= resting_price,
                Side::Sell => limit <= resting_price,
            },
        }
    }
}
