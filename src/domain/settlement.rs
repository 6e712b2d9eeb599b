// ============================================================================
// Settlement and Refund
// What the engine owes participants; the wallet/inventory layer pays it out
// ============================================================================

use super::order::{ItemId, Order, OrderId, OwnerId, Side, Volume};
use super::trade::Trade;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Result of claiming an order's trades.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub order_id: OrderId,
    pub owner: OwnerId,
    pub item: ItemId,
    pub side: Side,
    /// Item units owed to a buyer
    pub units: Volume,
    /// Currency owed to a seller
    pub proceeds: Decimal,
    /// Trades collected by this claim, in execution order
    pub trades: Vec<Arc<Trade>>,
}

impl Settlement {
    pub(crate) fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            owner: order.owner,
            item: order.item.clone(),
            side: order.side,
            units: 0,
            proceeds: Decimal::ZERO,
            trades: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, trade: &Arc<Trade>) {
        match self.side {
            Side::Buy => self.units = self.units.saturating_add(trade.amount),
            Side::Sell => self.proceeds = self.proceeds.saturating_add(trade.notional_value()),
        }
        self.trades.push(Arc::clone(trade));
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

/// Escrow returned when an order is cancelled with volume left.
///
/// A cancelled sell returns `volume` item units. A cancelled buy returns currency for
/// `volume` units; `currency` carries the amount when the order had a limit price.
#[derive(Debug, Clone, PartialEq)]
pub struct Refund {
    pub order_id: OrderId,
    pub owner: OwnerId,
    pub item: ItemId,
    pub side: Side,
    pub volume: Volume,
    pub currency: Option<Decimal>,
}

impl Refund {
    pub(crate) fn for_order(order: &Order) -> Self {
        let volume = order.remaining_volume();
        let currency = match order.side {
            Side::Buy => order
                .limit_price
                .map(|price| price.saturating_mul(Decimal::from(volume))),
            Side::Sell => None,
        };

        Self {
            order_id: order.id,
            owner: order.owner,
            item: order.item.clone(),
            side: order.side,
            volume,
            currency,
        }
    }

    /// Item units to hand back (sell orders only).
    pub fn goods(&self) -> Volume {
        match self.side {
            Side::Buy => 0,
            Side::Sell => self.volume,
        }
    }
}
