// ============================================================================
// Price/Time Priority Matching Algorithm (FIFO)
// Continuous double auction at the resting order's price
// ============================================================================

use crate::domain::{Order, OrderBookSide, OrderId, Sequencer, Side, Trade};
use crate::interfaces::MatchingAlgorithm;
use std::collections::HashMap;
use std::sync::Arc;

/// Price/Time Priority (FIFO) matching algorithm
///
/// Better prices match first; equal prices match in arrival order. Trades execute at
/// the resting order's price, so an aggressive incoming order gets any price
/// improvement. Resting orders of the incoming order's owner are skipped, not
/// treated as the end of the book.
///
/// # Example
/// ```text
/// Book:  SELL 5 @ 10 (Order A, seq 1)
///        SELL 2 @ 10 (Order B, seq 2)
///
/// Incoming: BUY 6 @ 12
/// Result: 5 with A @ 10, then 1 with B @ 10
/// ```
#[derive(Debug, Default)]
pub struct PriceTimePriority;

impl PriceTimePriority {
    pub fn new() -> Self {
        Self
    }
}

impl MatchingAlgorithm for PriceTimePriority {
    fn match_order(
        &self,
        incoming: &mut Order,
        opposite: &OrderBookSide,
        orders: &mut HashMap<OrderId, Order>,
        trade_sequence: &Sequencer,
    ) -> Vec<Arc<Trade>> {
        let mut trades = Vec::new();

        for entry in opposite.entries() {
            if incoming.remaining_volume() == 0 {
                break;
            }

            let resting_entry = entry.value();

            // Sides are price-ordered: the first non-crossing price ends matching
            if !self.prices_cross(incoming, resting_entry.price) {
                break;
            }

            // Self-trade prevention: leave it in place and keep looking
            if resting_entry.owner == incoming.owner {
                continue;
            }

            let Some(resting) = orders.get_mut(&resting_entry.order_id) else {
                tracing::error!(order_id = %resting_entry.order_id, "resting order missing from book");
                entry.remove();
                continue;
            };

            let amount = incoming.remaining_volume().min(resting.remaining_volume());
            let sequence = trade_sequence.next();
            let trade = Arc::new(match incoming.side {
                Side::Buy => Trade::between(incoming, resting, amount, resting_entry.price, sequence),
                Side::Sell => {
                    Trade::between(resting, incoming, amount, resting_entry.price, sequence)
                },
            });

            resting.record_fill(Arc::clone(&trade));
            incoming.record_fill(Arc::clone(&trade));

            if resting.remaining_volume() == 0 {
                entry.remove();
            }

            trades.push(trade);
        }

        trades
    }

    fn name(&self) -> &str {
        "PriceTime"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::state::OrderStatus;
    use crate::domain::{OrderRequest, OwnerId, Volume};
    use rust_decimal::Decimal;

    struct Fixture {
        side: OrderBookSide,
        orders: HashMap<OrderId, Order>,
        sequence: Sequencer,
    }

    impl Fixture {
        fn new(side: Side) -> Self {
            Self {
                side: OrderBookSide::new(side),
                orders: HashMap::new(),
                sequence: Sequencer::new(),
            }
        }

        fn rest(&mut self, owner: OwnerId, price: i64, volume: Volume) -> OrderId {
            let order = Order::from_request(
                OrderRequest::limit(owner, "gold", self.side.side(), Decimal::from(price), volume),
                self.sequence.next(),
            );
            self.side.insert(&order);
            let id = order.id;
            self.orders.insert(id, order);
            id
        }

        fn incoming(&self, request: OrderRequest) -> Order {
            Order::from_request(request, self.sequence.next())
        }

        fn run(&mut self, incoming: &mut Order) -> Vec<Arc<Trade>> {
            PriceTimePriority::new().match_order(
                incoming,
                &self.side,
                &mut self.orders,
                &Sequencer::new(),
            )
        }
    }

    #[test]
    fn test_price_time_fifo_order() {
        let mut book = Fixture::new(Side::Sell);
        let first = book.rest(OwnerId::new(), 10, 1);
        let second = book.rest(OwnerId::new(), 10, 1);

        let mut buy = book.incoming(OrderRequest::limit(
            OwnerId::new(),
            "gold",
            Side::Buy,
            Decimal::from(10),
            1,
        ));
        let trades = book.run(&mut buy);

        assert_eq!(trades.len(), 1);
        // Should match with the earlier order due to FIFO
        assert_eq!(trades[0].sell_order_id, first);
        assert!(book.side.contains(&second));
        assert!(!book.side.contains(&first));
    }

    #[test]
    fn test_better_price_beats_earlier_time() {
        let mut book = Fixture::new(Side::Buy);
        book.rest(OwnerId::new(), 9, 1);
        let better = book.rest(OwnerId::new(), 11, 1);

        let mut sell = book.incoming(OrderRequest::limit(
            OwnerId::new(),
            "gold",
            Side::Sell,
            Decimal::from(8),
            1,
        ));
        let trades = book.run(&mut sell);

        assert_eq!(trades[0].buy_order_id, better);
        assert_eq!(trades[0].price, Decimal::from(11));
    }

    #[test]
    fn test_partial_fill_keeps_maker_priority() {
        let mut book = Fixture::new(Side::Sell);
        let maker = book.rest(OwnerId::new(), 10, 5);

        let mut buy = book.incoming(OrderRequest::limit(
            OwnerId::new(),
            "gold",
            Side::Buy,
            Decimal::from(12),
            3,
        ));
        let trades = book.run(&mut buy);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].amount, 3);
        assert_eq!(trades[0].price, Decimal::from(10));
        assert_eq!(buy.status(), OrderStatus::Filled);
        assert_eq!(book.orders[&maker].status(), OrderStatus::PartiallyFilled);
        assert_eq!(book.orders[&maker].remaining_volume(), 2);
        assert_eq!(book.side.order_ids(), vec![maker]);
    }

    #[test]
    fn test_skips_own_orders_and_continues() {
        let me = OwnerId::new();
        let mut book = Fixture::new(Side::Sell);
        let own = book.rest(me, 5, 2);
        let other = book.rest(OwnerId::new(), 6, 2);

        let mut buy = book.incoming(OrderRequest::limit(me, "gold", Side::Buy, Decimal::from(6), 2));
        let trades = book.run(&mut buy);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].sell_order_id, other);
        assert!(book.side.contains(&own));
        assert_eq!(book.orders[&own].status(), OrderStatus::Open);
    }

    #[test]
    fn test_stops_at_first_non_crossing_price() {
        let mut book = Fixture::new(Side::Sell);
        book.rest(OwnerId::new(), 5, 1);
        book.rest(OwnerId::new(), 8, 1);

        let mut buy = book.incoming(OrderRequest::limit(
            OwnerId::new(),
            "gold",
            Side::Buy,
            Decimal::from(6),
            2,
        ));
        let trades = book.run(&mut buy);

        assert_eq!(trades.len(), 1);
        assert_eq!(buy.remaining_volume(), 1);
        assert_eq!(book.side.len(), 1);
    }

    #[test]
    fn test_market_order_sweeps_levels() {
        let mut book = Fixture::new(Side::Buy);
        book.rest(OwnerId::new(), 10, 2);
        book.rest(OwnerId::new(), 7, 2);

        let mut sell = book.incoming(OrderRequest::market(OwnerId::new(), "gold", Side::Sell, 5));
        let trades = book.run(&mut sell);

        let prices: Vec<Decimal> = trades.iter().map(|trade| trade.price).collect();
        assert_eq!(prices, vec![Decimal::from(10), Decimal::from(7)]);
        assert_eq!(sell.remaining_volume(), 1);
        assert!(book.side.is_empty());
    }
}
