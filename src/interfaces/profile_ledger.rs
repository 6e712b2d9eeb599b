// ============================================================================
// Profile Ledger Interface
// Contract for the per-participant statistics store
// ============================================================================

use crate::domain::{Order, OrderId, OwnerId, Price, Side, Trade, TradeId, Volume};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Side effects of matching that a ledger aggregates per owner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LedgerEvent {
    OrderPlaced {
        order_id: OrderId,
        owner: OwnerId,
        side: Side,
    },
    TradeExecuted {
        trade_id: TradeId,
        owner: OwnerId,
        side: Side,
        amount: Volume,
        price: Price,
    },
}

impl LedgerEvent {
    pub fn order_placed(order: &Order) -> Self {
        LedgerEvent::OrderPlaced {
            order_id: order.id,
            owner: order.owner,
            side: order.side,
        }
    }

    /// The trade as seen by one of its two counterparties.
    pub fn trade_executed(trade: &Trade, side: Side) -> Self {
        LedgerEvent::TradeExecuted {
            trade_id: trade.id,
            owner: trade.owner_for(side),
            side,
            amount: trade.amount,
            price: trade.price,
        }
    }

    pub fn owner(&self) -> &OwnerId {
        match self {
            LedgerEvent::OrderPlaced { owner, .. } | LedgerEvent::TradeExecuted { owner, .. } => {
                owner
            },
        }
    }
}

/// Durable per-owner aggregation of [`LedgerEvent`]s.
///
/// Delivery is at-least-once: a trade's event for a side may arrive again (claims
/// re-deliver it), so implementations must apply `TradeExecuted` at most once per
/// (trade id, side).
pub trait ProfileLedger: Send + Sync {
    fn record(&self, event: &LedgerEvent);

    fn record_all(&self, events: &[LedgerEvent]) {
        for event in events {
            self.record(event);
        }
    }

    /// Zero statistics for one owner, or for everyone.
    fn reset(&self, _owner: Option<&OwnerId>) {}
}

/// Lets the registry turn away participants before their orders reach a book.
pub trait AdmissionCheck: Send + Sync {
    fn is_restricted(&self, owner: &OwnerId) -> bool;
}

/// Ledger that drops everything
pub struct NoOpLedger;

impl ProfileLedger for NoOpLedger {
    fn record(&self, _event: &LedgerEvent) {}
}
