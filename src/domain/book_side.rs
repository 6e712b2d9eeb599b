// ============================================================================
// Order Book Side Domain Model
// ============================================================================

use crossbeam_skiplist::map::Iter;
use crossbeam_skiplist::SkipMap;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::{ItemId, Order, OrderId, OwnerId, Price, Side, Volume};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Priority Key
// ============================================================================

/// Sort key of a resting order. Ascending key order is matching priority on both
/// sides: buy prices are stored negated, so the highest bid sorts first, and equal
/// prices fall back to the earlier insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriorityKey {
    rank: Decimal,
    sequence: u64,
}

impl PriorityKey {
    pub fn new(side: Side, price: Price, sequence: u64) -> Self {
        let rank = match side {
            Side::Buy => -price,
            Side::Sell => price,
        };
        Self { rank, sequence }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// What a side keeps about a resting order. Volumes live on the order itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestingEntry {
    pub order_id: OrderId,
    pub owner: OwnerId,
    pub price: Price,
}

// ============================================================================
// Order Book Side
// ============================================================================

/// One side (bids or asks) of a book, kept in price-time priority.
///
/// The skip list gives ordered insert and remove without re-sorting. All access goes
/// through the owning book's lock; the concurrent map only lets the matching loop
/// remove entries while it walks them.
#[derive(Debug)]
pub struct OrderBookSide {
    side: Side,
    entries: SkipMap<PriorityKey, RestingEntry>,
}

impl OrderBookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            entries: SkipMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Rest an order on this side. Orders without a limit price never rest, so
    /// this returns false for them.
    pub fn insert(&self, order: &Order) -> bool {
        debug_assert_eq!(order.side, self.side);
        let Some(price) = order.limit_price else {
            return false;
        };

        self.entries.insert(
            PriorityKey::new(self.side, price, order.created_at),
            RestingEntry {
                order_id: order.id,
                owner: order.owner,
                price,
            },
        );
        true
    }

    pub fn remove(&self, order: &Order) -> bool {
        order
            .limit_price
            .map(|price| {
                self.entries
                    .remove(&PriorityKey::new(self.side, price, order.created_at))
                    .is_some()
            })
            .unwrap_or(false)
    }

    /// Entries in priority order.
    pub fn entries(&self) -> Iter<'_, PriorityKey, RestingEntry> {
        self.entries.iter()
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.value().order_id == *order_id)
    }

    /// Best resting entry, optionally ignoring one owner's orders.
    pub fn best(&self, excluding: Option<&OwnerId>) -> Option<RestingEntry> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .find(|resting| excluding != Some(&resting.owner))
    }

    pub fn best_price(&self, excluding: Option<&OwnerId>) -> Option<Price> {
        self.best(excluding).map(|resting| resting.price)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Order ids in priority order.
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.entries
            .iter()
            .map(|entry| entry.value().order_id)
            .collect()
    }

    /// Remove every entry, returning the ids in priority order.
    pub fn clear(&self) -> Vec<OrderId> {
        let ids = self.order_ids();
        self.entries.clear();
        ids
    }

    /// Aggregate remaining volume per price for the best `num_levels` prices.
    pub fn depth(&self, num_levels: usize, orders: &HashMap<OrderId, Order>) -> Vec<(Price, Volume)> {
        let mut levels: Vec<(Price, Volume)> = Vec::new();

        for entry in self.entries.iter() {
            let resting = entry.value();
            let remaining = orders
                .get(&resting.order_id)
                .map(Order::remaining_volume)
                .unwrap_or(0);

            match levels.last_mut() {
                Some((price, volume)) if *price == resting.price => {
                    *volume = volume.saturating_add(remaining)
                },
                _ => {
                    if levels.len() == num_levels {
                        break;
                    }
                    levels.push((resting.price, remaining));
                },
            }
        }

        levels
    }
}

// ============================================================================
// Order Book Snapshot
// ============================================================================

/// Immutable snapshot of a book's depth.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderBookSnapshot {
    pub item: ItemId,
    /// Bid levels (price, volume), best first
    pub bids: Vec<(Price, Volume)>,
    /// Ask levels (price, volume), best first
    pub asks: Vec<(Price, Volume)>,
    /// Current spread (ask - bid)
    pub spread: Option<Price>,
    pub mid_price: Option<Price>,
}

impl OrderBookSnapshot {
    pub fn with_depth(item: ItemId, bids: Vec<(Price, Volume)>, asks: Vec<(Price, Volume)>) -> Self {
        let spread = match (bids.first(), asks.first()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        };

        let mid_price = match (bids.first(), asks.first()) {
            (Some((bid, _)), Some((ask, _))) => Some(bid + (ask - bid) / Decimal::from(2)),
            _ => None,
        };

        Self {
            item,
            bids,
            asks,
            spread,
            mid_price,
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|(price, _)| *price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|(price, _)| *price)
    }

    pub fn total_bid_volume(&self) -> Volume {
        self.bids
            .iter()
            .fold(0, |total: Volume, (_, volume)| total.saturating_add(*volume))
    }

    pub fn total_ask_volume(&self) -> Volume {
        self.asks
            .iter()
            .fold(0, |total: Volume, (_, volume)| total.saturating_add(*volume))
    }
}

/// Price summary of one item as seen by a participant: their own resting orders are
/// left out of the best prices, but counted in the order totals.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PriceQuote {
    pub item: ItemId,
    pub best_buy: Option<Price>,
    pub best_sell: Option<Price>,
    pub buy_orders: usize,
    pub sell_orders: usize,
}
