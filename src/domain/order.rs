// ============================================================================
// Order Domain Model
// ============================================================================

use super::errors::{MarketError, MarketResult};
use super::records::OrderRecord;
use super::settlement::{Refund, Settlement};
use super::trade::Trade;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Price of one item unit in market currency.
pub type Price = Decimal;

/// Whole item units.
pub type Volume = u64;

/// Trades of a single order. Most orders fill against a handful of counterparts.
pub type OrderTrades = SmallVec<[Arc<Trade>; 4]>;

// ============================================================================
// Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque participant identity, owned by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Catalog key of a tradable good.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemId(Arc<str>);

impl ItemId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ItemId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderKind {
    /// Rests in the book at its limit price until filled or cancelled
    Limit,
    /// Takes whatever liquidity is available; the unfilled remainder is cancelled
    Market,
}

// ============================================================================
// Order State Machine
// ============================================================================

pub mod state {
    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub enum OrderStatus {
        Open,
        PartiallyFilled,
        Filled,
        Cancelled,
    }

    impl OrderStatus {
        pub fn is_terminal(&self) -> bool {
            matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
        }

        pub fn is_cancellable(&self) -> bool {
            matches!(self, OrderStatus::Open | OrderStatus::PartiallyFilled)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum OrderTransition {
        PartialFill,
        Fill,
        Cancel,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
    #[error("invalid transition from {from:?} via {via:?}")]
    pub struct InvalidTransition {
        pub from: OrderStatus,
        pub via: OrderTransition,
    }

    impl OrderStatus {
        pub fn transition(&self, via: OrderTransition) -> Result<OrderStatus, InvalidTransition> {
            match (self, via) {
                (OrderStatus::Open, OrderTransition::PartialFill)
                | (OrderStatus::PartiallyFilled, OrderTransition::PartialFill) => {
                    Ok(OrderStatus::PartiallyFilled)
                },
                (OrderStatus::Open, OrderTransition::Fill)
                | (OrderStatus::PartiallyFilled, OrderTransition::Fill) => Ok(OrderStatus::Filled),
                (OrderStatus::Open, OrderTransition::Cancel)
                | (OrderStatus::PartiallyFilled, OrderTransition::Cancel) => {
                    Ok(OrderStatus::Cancelled)
                },
                _ => Err(InvalidTransition { from: *self, via }),
            }
        }
    }
}

use state::{OrderStatus, OrderTransition};

// ============================================================================
// Order Request
// ============================================================================

/// Intent handed to the engine by the command layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderRequest {
    pub owner: OwnerId,
    pub item: ItemId,
    pub side: Side,
    pub kind: OrderKind,
    pub limit_price: Option<Price>,
    pub volume: Volume,
}

impl OrderRequest {
    pub fn limit(
        owner: OwnerId,
        item: impl Into<ItemId>,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Self {
        Self {
            owner,
            item: item.into(),
            side,
            kind: OrderKind::Limit,
            limit_price: Some(price),
            volume,
        }
    }

    pub fn market(owner: OwnerId, item: impl Into<ItemId>, side: Side, volume: Volume) -> Self {
        Self {
            owner,
            item: item.into(),
            side,
            kind: OrderKind::Market,
            limit_price: None,
            volume,
        }
    }
}

// ============================================================================
// Order Entity
// ============================================================================

/// An order and everything it has traded so far.
///
/// Orders are mutated only by their owning book while it holds its lock. Values handed
/// out by the book are snapshots: they share the underlying [`Trade`]s, so claiming
/// through a snapshot is still exactly-once per trade.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub owner: OwnerId,
    pub item: ItemId,
    pub side: Side,
    pub kind: OrderKind,
    pub limit_price: Option<Price>,
    pub requested_volume: Volume,
    /// Insertion sequence; the time half of price-time priority.
    pub created_at: u64,
    /// Wall-clock submission time, for display only.
    pub timestamp: DateTime<Utc>,
    trades: OrderTrades,
    filled_volume: Volume,
    status: OrderStatus,
}

impl Order {
    pub(crate) fn from_request(request: OrderRequest, created_at: u64) -> Self {
        let limit_price = match request.kind {
            OrderKind::Limit => request.limit_price,
            OrderKind::Market => None,
        };

        Self {
            id: OrderId::new(),
            owner: request.owner,
            item: request.item,
            side: request.side,
            kind: request.kind,
            limit_price,
            requested_volume: request.volume,
            created_at,
            timestamp: Utc::now(),
            trades: OrderTrades::new(),
            filled_volume: 0,
            status: OrderStatus::Open,
        }
    }

    /// Rebuild an order from its persisted form and its already-restored trades.
    pub(crate) fn from_record(record: &OrderRecord, trades: OrderTrades) -> MarketResult<Self> {
        let mut filled_volume: Volume = 0;
        for trade in &trades {
            if trade.order_id_for(record.side) != record.id {
                return Err(MarketError::CorruptRecord(format!(
                    "trade {} does not belong to order {}",
                    trade.id, record.id
                )));
            }
            filled_volume = filled_volume.saturating_add(trade.amount);
        }

        if filled_volume > record.requested_volume {
            return Err(MarketError::CorruptRecord(format!(
                "order {} filled {} of {} units",
                record.id, filled_volume, record.requested_volume
            )));
        }

        let remaining = record.requested_volume - filled_volume;
        let consistent = match record.status {
            OrderStatus::Open => filled_volume == 0 && remaining > 0,
            OrderStatus::PartiallyFilled => filled_volume > 0 && remaining > 0,
            OrderStatus::Filled => remaining == 0,
            OrderStatus::Cancelled => true,
        };
        let in_range = record.limit_price.map_or(true, |price| {
            price > Decimal::ZERO
                && price
                    .checked_mul(Decimal::from(record.requested_volume))
                    .is_some()
        });
        if !consistent || !in_range || record.requested_volume == 0 {
            return Err(MarketError::CorruptRecord(format!(
                "order {} is {:?} with {} of {} units filled",
                record.id, record.status, filled_volume, record.requested_volume
            )));
        }

        Ok(Self {
            id: record.id,
            owner: record.owner,
            item: record.item.clone(),
            side: record.side,
            kind: record.kind,
            limit_price: record.limit_price,
            requested_volume: record.requested_volume,
            created_at: record.created_at,
            timestamp: record.timestamp,
            trades,
            filled_volume,
            status: record.status,
        })
    }

    // ========================================================================
    // Getters
    // ========================================================================

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn filled_volume(&self) -> Volume {
        self.filled_volume
    }

    pub fn remaining_volume(&self) -> Volume {
        self.requested_volume - self.filled_volume
    }

    pub fn trades(&self) -> &[Arc<Trade>] {
        &self.trades
    }

    pub fn is_cancellable(&self) -> bool {
        self.status.is_cancellable()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_market_order(&self) -> bool {
        matches!(self.kind, OrderKind::Market)
    }

    pub fn is_limit_order(&self) -> bool {
        matches!(self.kind, OrderKind::Limit)
    }

    /// Whether any trade still owes this order's side its settlement.
    pub fn has_unclaimed_trades(&self) -> bool {
        self.trades
            .iter()
            .any(|trade| !trade.is_claimed_by(self.side))
    }

    // ========================================================================
    // Mutations (owning book only)
    // ========================================================================

    pub(crate) fn record_fill(&mut self, trade: Arc<Trade>) {
        debug_assert!(!self.status.is_terminal(), "fill on terminal order {}", self.id);
        debug_assert!(
            trade.amount <= self.remaining_volume(),
            "fill of {} exceeds remaining {} on order {}",
            trade.amount,
            self.remaining_volume(),
            self.id
        );
        debug_assert_eq!(trade.order_id_for(self.side), self.id);

        self.filled_volume += trade.amount;
        let via = if self.remaining_volume() == 0 {
            OrderTransition::Fill
        } else {
            OrderTransition::PartialFill
        };
        if let Ok(next) = self.status.transition(via) {
            self.status = next;
        }
        self.trades.push(trade);
    }

    /// Returns true if the order moved to `Cancelled`.
    pub(crate) fn try_cancel(&mut self) -> bool {
        match self.status.transition(OrderTransition::Cancel) {
            Ok(next) => {
                self.status = next;
                true
            },
            Err(_) => false,
        }
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Collect settlement for every trade this order's side has not claimed yet.
    ///
    /// A buy order collects item units, a sell order collects proceeds. Each trade's
    /// claim flag is flipped by compare-and-set, so concurrent callers never collect
    /// the same trade twice; once everything is claimed the result is empty.
    pub fn claim(&self) -> Settlement {
        let mut settlement = Settlement::for_order(self);
        for trade in &self.trades {
            if trade.try_claim(self.side) {
                settlement.add(trade);
            }
        }
        settlement
    }

    /// Refund owed for a cancelled order: always the remainder at cancellation time.
    pub fn refund(&self) -> Option<Refund> {
        if self.status != OrderStatus::Cancelled || self.remaining_volume() == 0 {
            return None;
        }
        Some(Refund::for_order(self))
    }

    pub fn to_record(&self) -> OrderRecord {
        OrderRecord {
            id: self.id,
            owner: self.owner,
            item: self.item.clone(),
            side: self.side,
            kind: self.kind,
            limit_price: self.limit_price,
            requested_volume: self.requested_volume,
            trade_ids: self.trades.iter().map(|trade| trade.id).collect(),
            status: self.status,
            created_at: self.created_at,
            timestamp: self.timestamp,
        }
    }
}
