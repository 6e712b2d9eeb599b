// ============================================================================
// Persisted Records
// Durable shape of orders, trades and books, owned by an external store
// ============================================================================
//
// Book ordering is not persisted: a reload rebuilds both sides from each open
// order's limit price and `created_at` sequence.

use super::order::state::OrderStatus;
use super::order::{ItemId, OrderId, OrderKind, OwnerId, Price, Side, Volume};
use super::stats::BookStats;
use super::trade::TradeId;
use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderRecord {
    pub id: OrderId,
    pub owner: OwnerId,
    pub item: ItemId,
    pub side: Side,
    pub kind: OrderKind,
    pub limit_price: Option<Price>,
    pub requested_volume: Volume,
    /// Trades in the order they were appended
    pub trade_ids: Vec<TradeId>,
    pub status: OrderStatus,
    pub created_at: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TradeRecord {
    pub id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer: OwnerId,
    pub seller: OwnerId,
    pub amount: Volume,
    pub price: Price,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub claimed_by_buyer: bool,
    pub claimed_by_seller: bool,
}

/// Everything one book needs to come back after a restart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookRecord {
    pub item: ItemId,
    /// Sorted by `created_at`
    pub orders: Vec<OrderRecord>,
    /// Sorted by `sequence`
    pub trades: Vec<TradeRecord>,
    pub stats: BookStats,
}

#[cfg(feature = "serde")]
impl BookRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
