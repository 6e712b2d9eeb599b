// ============================================================================
// Order Book
// One lockable book per item: validation, matching, cancellation and claims
// ============================================================================

use crate::domain::order::state::OrderStatus;
use crate::domain::{
    BookRecord, BookStats, ItemId, MarketError, MarketResult, Order, OrderBookSide,
    OrderBookSnapshot, OrderId, OrderKind, OrderRecord, OrderRequest, OrderRules, OrderTrades,
    OwnerId, Price, PriceQuote, Refund, Sequencer, Settlement, Side, Trade, TradeId, TradeRecord,
};
use crate::engine::{MarketGate, PriceTimePriority};
use crate::interfaces::{
    EventHandler, LedgerEvent, MarketEvent, MatchingAlgorithm, NoOpEventHandler, NoOpLedger,
    ProfileLedger,
};
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// Book Context
// ============================================================================

/// Everything a book shares with the rest of the market.
#[derive(Clone)]
pub struct BookContext {
    pub gate: MarketGate,
    /// Source of `created_at` for new orders
    pub order_sequence: Sequencer,
    /// Source of trade sequence numbers
    pub trade_sequence: Sequencer,
    pub rules: OrderRules,
    pub events: Arc<dyn EventHandler>,
    pub ledger: Arc<dyn ProfileLedger>,
}

impl Default for BookContext {
    fn default() -> Self {
        Self {
            gate: MarketGate::default(),
            order_sequence: Sequencer::new(),
            trade_sequence: Sequencer::new(),
            rules: OrderRules::default(),
            events: Arc::new(NoOpEventHandler),
            ledger: Arc::new(NoOpLedger),
        }
    }
}

/// Outcome of a successful submit: the incoming order after matching and the trades
/// it produced, in execution order.
#[derive(Debug, Clone)]
pub struct Submission {
    pub order: Order,
    pub trades: Vec<Arc<Trade>>,
}

impl Submission {
    /// Unfilled remainder of a market order, owed back to its owner.
    pub fn refund(&self) -> Option<Refund> {
        self.order.refund()
    }

    pub fn into_parts(self) -> (Order, Vec<Arc<Trade>>) {
        (self.order, self.trades)
    }
}

// ============================================================================
// Order Book
// ============================================================================

struct BookState {
    bids: OrderBookSide,
    asks: OrderBookSide,
    /// Every order this book has accepted, resting or terminal, until
    /// [`OrderBook::prune_settled`] drops the settled ones
    orders: HashMap<OrderId, Order>,
    stats: BookStats,
}

impl BookState {
    fn new() -> Self {
        Self {
            bids: OrderBookSide::new(Side::Buy),
            asks: OrderBookSide::new(Side::Sell),
            orders: HashMap::new(),
            stats: BookStats::default(),
        }
    }

    fn side(&self, side: Side) -> &OrderBookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }
}

/// All open orders for one item.
///
/// Every operation takes the book's single lock for its whole duration, which
/// serializes everything that touches this item. Event handlers and the ledger are
/// called after the lock is released. Nothing ever holds two book locks.
pub struct OrderBook {
    item: ItemId,
    algorithm: Arc<dyn MatchingAlgorithm>,
    context: BookContext,
    state: Mutex<BookState>,
}

impl OrderBook {
    /// Standalone book: open gate, own sequencers, no listeners.
    pub fn new(item: impl Into<ItemId>) -> Self {
        Self::with_context(
            item.into(),
            Arc::new(PriceTimePriority::new()),
            BookContext::default(),
        )
    }

    pub fn with_context(
        item: ItemId,
        algorithm: Arc<dyn MatchingAlgorithm>,
        context: BookContext,
    ) -> Self {
        Self {
            item,
            algorithm,
            context,
            state: Mutex::new(BookState::new()),
        }
    }

    pub fn item(&self) -> &ItemId {
        &self.item
    }

    // ========================================================================
    // Order Entry
    // ========================================================================

    /// Validate, admit and match an order.
    ///
    /// A limit order with volume left rests on its side; a market order with volume
    /// left is cancelled on the spot and its remainder is reported through
    /// [`Submission::refund`].
    pub fn submit(&self, request: OrderRequest) -> MarketResult<Submission> {
        if let Err(err) = self.validate(&request) {
            debug!(item = %self.item, owner = %request.owner, %err, "order rejected");
            return Err(err);
        }

        if !self.context.gate.is_open() {
            debug!(item = %self.item, owner = %request.owner, "order rejected: market closed");
            return Err(MarketError::MarketClosed);
        }

        let (submission, filled_makers) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            let mut order = Order::from_request(request, self.context.order_sequence.next());
            let opposite = match order.side {
                Side::Buy => &state.asks,
                Side::Sell => &state.bids,
            };
            let trades = self.algorithm.match_order(
                &mut order,
                opposite,
                &mut state.orders,
                &self.context.trade_sequence,
            );

            let filled_makers: Vec<OrderId> = trades
                .iter()
                .map(|trade| trade.order_id_for(order.side.opposite()))
                .filter(|id| {
                    state
                        .orders
                        .get(id)
                        .is_some_and(|maker| maker.status() == OrderStatus::Filled)
                })
                .collect();

            if order.remaining_volume() > 0 {
                match order.kind {
                    OrderKind::Limit => {
                        let rested = state.side(order.side).insert(&order);
                        debug_assert!(rested, "limit order {} without a price", order.id);
                    },
                    OrderKind::Market => {
                        let cancelled = order.try_cancel();
                        debug_assert!(cancelled);
                        state.stats.record_cancel();
                    },
                }
            }

            state.stats.record_order();
            for trade in &trades {
                state.stats.record_trade(trade);
            }
            state.orders.insert(order.id, order.clone());

            (Submission { order, trades }, filled_makers)
        };

        self.publish_submission(&submission, &filled_makers);
        Ok(submission)
    }

    /// Cancel a resting order. The returned order carries the refund for its
    /// remaining volume.
    pub fn cancel(&self, order_id: OrderId) -> MarketResult<Order> {
        let cancelled = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            let order = state
                .orders
                .get_mut(&order_id)
                .ok_or(MarketError::NotFound(order_id))?;
            if !order.is_cancellable() {
                return Err(MarketError::NotCancellable {
                    order_id,
                    status: order.status(),
                });
            }

            let side = match order.side {
                Side::Buy => &state.bids,
                Side::Sell => &state.asks,
            };
            let removed = side.remove(order);
            debug_assert!(removed, "cancellable order {order_id} was not resting");

            order.try_cancel();
            state.stats.record_cancel();
            order.clone()
        };

        info!(
            item = %self.item,
            %order_id,
            owner = %cancelled.owner,
            remaining = cancelled.remaining_volume(),
            "order cancelled"
        );
        self.context.events.on_event(MarketEvent::OrderCancelled {
            order_id,
            item: self.item.clone(),
            remaining: cancelled.remaining_volume(),
            timestamp: Utc::now(),
        });

        Ok(cancelled)
    }

    /// Collect settlement for an order's unclaimed trades.
    ///
    /// The trade list is read under the lock; the claim flags themselves are flipped
    /// by compare-and-set, so duplicate claims collect nothing.
    pub fn claim(&self, order_id: OrderId) -> MarketResult<Settlement> {
        let order = self.order(order_id).ok_or(MarketError::NotFound(order_id))?;
        let settlement = order.claim();

        if !settlement.is_empty() {
            let ledger_events: Vec<LedgerEvent> = settlement
                .trades
                .iter()
                .map(|trade| LedgerEvent::trade_executed(trade, order.side))
                .collect();
            self.context.ledger.record_all(&ledger_events);

            debug!(
                item = %self.item,
                %order_id,
                trades = settlement.trades.len(),
                units = settlement.units,
                proceeds = %settlement.proceeds,
                "trades claimed"
            );
            self.context.events.on_event(MarketEvent::TradesClaimed {
                order_id,
                owner: order.owner,
                side: order.side,
                units: settlement.units,
                proceeds: settlement.proceeds,
                timestamp: Utc::now(),
            });
        }

        Ok(settlement)
    }

    /// Cancel every resting order and zero the statistics. Returns the cancelled
    /// orders so their refunds can be paid exactly as for [`OrderBook::cancel`].
    pub fn reset(&self) -> Vec<Order> {
        let cancelled: Vec<Order> = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            let ids: Vec<OrderId> = state
                .bids
                .clear()
                .into_iter()
                .chain(state.asks.clear())
                .collect();

            let mut cancelled = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(order) = state.orders.get_mut(&id) {
                    order.try_cancel();
                    cancelled.push(order.clone());
                }
            }

            state.stats = BookStats::default();
            cancelled
        };

        info!(item = %self.item, cancelled = cancelled.len(), "order book reset");

        let now = Utc::now();
        let mut events: Vec<MarketEvent> = cancelled
            .iter()
            .map(|order| MarketEvent::OrderCancelled {
                order_id: order.id,
                item: self.item.clone(),
                remaining: order.remaining_volume(),
                timestamp: now,
            })
            .collect();
        events.push(MarketEvent::BookReset {
            item: self.item.clone(),
            cancelled: cancelled.len(),
            timestamp: now,
        });
        self.context.events.on_events(events);

        cancelled
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn best_buy_price(&self, excluding_owner: Option<&OwnerId>) -> Option<Price> {
        self.state.lock().bids.best_price(excluding_owner)
    }

    pub fn best_sell_price(&self, excluding_owner: Option<&OwnerId>) -> Option<Price> {
        self.state.lock().asks.best_price(excluding_owner)
    }

    /// Open orders of one owner, bids first, each side in priority order.
    pub fn orders_of(&self, owner: &OwnerId) -> Vec<Order> {
        let state = self.state.lock();
        state
            .bids
            .entries()
            .chain(state.asks.entries())
            .filter(|entry| entry.value().owner == *owner)
            .filter_map(|entry| state.orders.get(&entry.value().order_id).cloned())
            .collect()
    }

    /// Any order this book has accepted, open or terminal.
    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.state.lock().orders.get(&order_id).cloned()
    }

    pub fn snapshot(&self, depth: usize) -> OrderBookSnapshot {
        let state = self.state.lock();
        let bids = state.bids.depth(depth, &state.orders);
        let asks = state.asks.depth(depth, &state.orders);

        OrderBookSnapshot::with_depth(self.item.clone(), bids, asks)
    }

    pub fn quote(&self, viewer: Option<&OwnerId>) -> PriceQuote {
        let state = self.state.lock();
        PriceQuote {
            item: self.item.clone(),
            best_buy: state.bids.best_price(viewer),
            best_sell: state.asks.best_price(viewer),
            buy_orders: state.bids.len(),
            sell_orders: state.asks.len(),
        }
    }

    pub fn stats(&self) -> BookStats {
        self.state.lock().stats.clone()
    }

    /// Number of resting orders on both sides.
    pub fn resting_orders(&self) -> usize {
        let state = self.state.lock();
        state.bids.len() + state.asks.len()
    }

    pub fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }

    // ========================================================================
    // Housekeeping
    // ========================================================================

    /// Drop filled and cancelled orders whose trades have all been claimed by their
    /// owner. Such orders have nothing left to pay out; afterwards they are no longer
    /// returned by [`OrderBook::order`] and claiming them reports `NotFound`.
    ///
    /// Returns the number of orders removed.
    pub fn prune_settled(&self) -> usize {
        let pruned = {
            let mut state = self.state.lock();
            let before = state.orders.len();
            state
                .orders
                .retain(|_, order| !order.is_terminal() || order.has_unclaimed_trades());
            before - state.orders.len()
        };

        if pruned > 0 {
            debug!(item = %self.item, pruned, "settled orders pruned");
        }
        pruned
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn export(&self) -> BookRecord {
        let state = self.state.lock();

        let mut orders: Vec<OrderRecord> = state.orders.values().map(Order::to_record).collect();
        orders.sort_by_key(|record| record.created_at);

        // Either party of a trade may have been pruned, so collect from both sides.
        let mut trades: Vec<TradeRecord> = state
            .orders
            .values()
            .flat_map(|order| order.trades().iter())
            .map(|trade| (trade.id, trade))
            .collect::<HashMap<TradeId, &Arc<Trade>>>()
            .into_values()
            .map(|trade| trade.to_record())
            .collect();
        trades.sort_by_key(|record| record.sequence);

        BookRecord {
            item: self.item.clone(),
            orders,
            trades,
            stats: state.stats.clone(),
        }
    }

    /// Rebuild a book from its record. Resting orders are re-inserted by limit price
    /// and `created_at`, which restores their exact priority; the context's
    /// sequencers are advanced past every restored sequence.
    pub fn restore(
        record: BookRecord,
        algorithm: Arc<dyn MatchingAlgorithm>,
        context: BookContext,
    ) -> MarketResult<Self> {
        let book = Self::with_context(record.item.clone(), algorithm, context);

        {
            let mut guard = book.state.lock();
            let state = &mut *guard;

            let trades: HashMap<TradeId, Arc<Trade>> = record
                .trades
                .iter()
                .map(|trade| {
                    Trade::from_record(trade, record.item.clone()).map(|trade| (trade.id, Arc::new(trade)))
                })
                .collect::<MarketResult<_>>()?;

            for order_record in &record.orders {
                if order_record.item != record.item {
                    return Err(MarketError::CorruptRecord(format!(
                        "order {} for {} stored in the {} book",
                        order_record.id, order_record.item, record.item
                    )));
                }

                let order_trades = order_record
                    .trade_ids
                    .iter()
                    .map(|trade_id| {
                        trades.get(trade_id).cloned().ok_or_else(|| {
                            MarketError::CorruptRecord(format!(
                                "order {} references unknown trade {}",
                                order_record.id, trade_id
                            ))
                        })
                    })
                    .collect::<MarketResult<OrderTrades>>()?;

                let order = Order::from_record(order_record, order_trades)?;
                if order.is_cancellable() && !state.side(order.side).insert(&order) {
                    return Err(MarketError::CorruptRecord(format!(
                        "open order {} has no limit price",
                        order.id
                    )));
                }

                book.context.order_sequence.advance_to(order.created_at);
                state.orders.insert(order.id, order);
            }

            if let Some(last) = trades.values().map(|trade| trade.sequence).max() {
                book.context.trade_sequence.advance_to(last);
            }
            state.stats = record.stats;
        }

        info!(item = %book.item, resting = book.resting_orders(), "order book restored");
        Ok(book)
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    fn validate(&self, request: &OrderRequest) -> MarketResult<()> {
        if request.item != self.item {
            return Err(MarketError::InvalidOrder(format!(
                "order for {} routed to the {} book",
                request.item, self.item
            )));
        }

        if request.volume == 0 {
            return Err(MarketError::InvalidOrder(
                "volume must be positive".to_string(),
            ));
        }

        if let Some(max) = self.context.rules.max_order_volume {
            if request.volume > max {
                return Err(MarketError::InvalidOrder(format!(
                    "volume {} exceeds the maximum of {}",
                    request.volume, max
                )));
            }
        }

        if request.kind == OrderKind::Limit {
            let price = request.limit_price.ok_or_else(|| {
                MarketError::InvalidOrder("limit orders must have a price".to_string())
            })?;

            if price <= Decimal::ZERO {
                return Err(MarketError::InvalidOrder(
                    "price must be positive".to_string(),
                ));
            }

            // Trades execute at a resting limit for at most that order's volume, so
            // this bounds the value of every trade.
            if price.checked_mul(Decimal::from(request.volume)).is_none() {
                return Err(MarketError::InvalidOrder(format!(
                    "{} units at {price} exceed the largest representable value",
                    request.volume
                )));
            }

            if let Some(tick) = self.context.rules.tick_size {
                if !(price % tick).is_zero() {
                    return Err(MarketError::InvalidOrder(format!(
                        "price {price} is not a multiple of the tick size {tick}"
                    )));
                }
            }
        }

        Ok(())
    }

    fn publish_submission(&self, submission: &Submission, filled_makers: &[OrderId]) {
        let order = &submission.order;
        let now = Utc::now();

        let mut ledger_events = Vec::with_capacity(1 + submission.trades.len() * 2);
        ledger_events.push(LedgerEvent::order_placed(order));

        let mut events = Vec::with_capacity(submission.trades.len() + filled_makers.len() + 2);
        events.push(MarketEvent::OrderAccepted {
            order_id: order.id,
            owner: order.owner,
            item: self.item.clone(),
            side: order.side,
            kind: order.kind,
            volume: order.requested_volume,
            timestamp: now,
        });

        for trade in &submission.trades {
            ledger_events.push(LedgerEvent::trade_executed(trade, Side::Buy));
            ledger_events.push(LedgerEvent::trade_executed(trade, Side::Sell));
            events.push(MarketEvent::TradeExecuted {
                trade: Arc::clone(trade),
                timestamp: now,
            });
        }

        for maker in filled_makers {
            events.push(MarketEvent::OrderFilled {
                order_id: *maker,
                item: self.item.clone(),
                timestamp: now,
            });
        }

        match order.status() {
            OrderStatus::Filled => events.push(MarketEvent::OrderFilled {
                order_id: order.id,
                item: self.item.clone(),
                timestamp: now,
            }),
            OrderStatus::Cancelled => events.push(MarketEvent::OrderCancelled {
                order_id: order.id,
                item: self.item.clone(),
                remaining: order.remaining_volume(),
                timestamp: now,
            }),
            OrderStatus::Open | OrderStatus::PartiallyFilled => {
                if let Some(price) = order.limit_price {
                    events.push(MarketEvent::OrderAddedToBook {
                        order_id: order.id,
                        item: self.item.clone(),
                        price,
                        remaining: order.remaining_volume(),
                        timestamp: now,
                    });
                }
            },
        }

        debug!(
            item = %self.item,
            order_id = %order.id,
            owner = %order.owner,
            side = ?order.side,
            kind = ?order.kind,
            trades = submission.trades.len(),
            status = ?order.status(),
            "order submitted"
        );

        self.context.ledger.record_all(&ledger_events);
        self.context.events.on_events(events);
    }
}
