// ============================================================================
// Trade Domain Model
// ============================================================================

use super::errors::{MarketError, MarketResult};
use super::order::{ItemId, Order, OrderId, OwnerId, Price, Side, Volume};
use super::records::TradeRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TradeId(Uuid);

impl TradeId {
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

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A fill between one buy order and one sell order.
///
/// Everything but the two claim flags is fixed at creation. The buyer collects goods and
/// the seller collects proceeds, each at their own pace, so each side has its own
/// one-way flag.
#[derive(Debug)]
pub struct Trade {
    pub id: TradeId,
    pub item: ItemId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer: OwnerId,
    pub seller: OwnerId,
    pub amount: Volume,
    /// Execution price; always the resting order's limit price
    pub price: Price,
    /// Global execution order, used for settlement and display
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    claimed_by_buyer: AtomicBool,
    claimed_by_seller: AtomicBool,
}

impl Trade {
    pub(crate) fn between(
        buy: &Order,
        sell: &Order,
        amount: Volume,
        price: Price,
        sequence: u64,
    ) -> Self {
        debug_assert_eq!(buy.side, Side::Buy);
        debug_assert_eq!(sell.side, Side::Sell);
        debug_assert!(amount > 0);

        Self {
            id: TradeId::new(),
            item: buy.item.clone(),
            buy_order_id: buy.id,
            sell_order_id: sell.id,
            buyer: buy.owner,
            seller: sell.owner,
            amount,
            price,
            sequence,
            timestamp: Utc::now(),
            claimed_by_buyer: AtomicBool::new(false),
            claimed_by_seller: AtomicBool::new(false),
        }
    }

    pub(crate) fn from_record(record: &TradeRecord, item: ItemId) -> MarketResult<Self> {
        if record.amount == 0 {
            return Err(MarketError::CorruptRecord(format!(
                "trade {} has zero amount",
                record.id
            )));
        }
        if record.price <= Decimal::ZERO
            || record.price.checked_mul(Decimal::from(record.amount)).is_none()
        {
            return Err(MarketError::CorruptRecord(format!(
                "trade {} has price {} for {} units",
                record.id, record.price, record.amount
            )));
        }
        if record.buyer == record.seller {
            return Err(MarketError::CorruptRecord(format!(
                "trade {} matches {} against itself",
                record.id, record.buyer
            )));
        }

        Ok(Self {
            id: record.id,
            item,
            buy_order_id: record.buy_order_id,
            sell_order_id: record.sell_order_id,
            buyer: record.buyer,
            seller: record.seller,
            amount: record.amount,
            price: record.price,
            sequence: record.sequence,
            timestamp: record.timestamp,
            claimed_by_buyer: AtomicBool::new(record.claimed_by_buyer),
            claimed_by_seller: AtomicBool::new(record.claimed_by_seller),
        })
    }

    /// Currency changing hands (price * amount). Admitted orders keep this in range;
    /// it saturates at `Decimal::MAX` otherwise.
    pub fn notional_value(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.amount))
    }

    pub fn order_id_for(&self, side: Side) -> OrderId {
        match side {
            Side::Buy => self.buy_order_id,
            Side::Sell => self.sell_order_id,
        }
    }

    pub fn owner_for(&self, side: Side) -> OwnerId {
        match side {
            Side::Buy => self.buyer,
            Side::Sell => self.seller,
        }
    }

    pub fn is_claimed_by(&self, side: Side) -> bool {
        self.claim_flag(side).load(Ordering::Acquire)
    }

    /// Atomically claim this trade for one side.
    /// Returns true only for the single caller that flipped the flag.
    pub fn try_claim(&self, side: Side) -> bool {
        self.claim_flag(side)
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Both counterparties have collected.
    pub fn is_settled(&self) -> bool {
        self.is_claimed_by(Side::Buy) && self.is_claimed_by(Side::Sell)
    }

    pub fn to_record(&self) -> TradeRecord {
        TradeRecord {
            id: self.id,
            buy_order_id: self.buy_order_id,
            sell_order_id: self.sell_order_id,
            buyer: self.buyer,
            seller: self.seller,
            amount: self.amount,
            price: self.price,
            sequence: self.sequence,
            timestamp: self.timestamp,
            claimed_by_buyer: self.is_claimed_by(Side::Buy),
            claimed_by_seller: self.is_claimed_by(Side::Sell),
        }
    }

    fn claim_flag(&self, side: Side) -> &AtomicBool {
        match side {
            Side::Buy => &self.claimed_by_buyer,
            Side::Sell => &self.claimed_by_seller,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderRequest;

    fn order(side: Side, volume: Volume) -> Order {
        Order::from_request(
            OrderRequest::limit(OwnerId::new(), "emerald", side, Decimal::from(50), volume),
            1,
        )
    }

    #[test]
    fn test_trade_creation() {
        let buy = order(Side::Buy, 4);
        let sell = order(Side::Sell, 4);
        let trade = Trade::between(&buy, &sell, 4, Decimal::from(50), 9);

        assert_eq!(trade.item, ItemId::from("emerald"));
        assert_eq!(trade.order_id_for(Side::Buy), buy.id);
        assert_eq!(trade.order_id_for(Side::Sell), sell.id);
        assert_eq!(trade.owner_for(Side::Sell), sell.owner);
        assert_eq!(trade.notional_value(), Decimal::from(200));
        assert_eq!(trade.sequence, 9);
        assert!(!trade.is_settled());
    }

    #[test]
    fn test_notional_value_with_fractional_price() {
        let buy = order(Side::Buy, 2);
        let sell = order(Side::Sell, 2);
        let trade = Trade::between(&buy, &sell, 2, Decimal::new(1005, 1), 1);

        // 100.5 * 2 = 201.0
        assert_eq!(trade.notional_value(), Decimal::from(201));
    }

    #[test]
    fn test_claim_flags_are_independent_and_one_way() {
        let buy = order(Side::Buy, 1);
        let sell = order(Side::Sell, 1);
        let trade = Trade::between(&buy, &sell, 1, Decimal::from(50), 1);

        assert!(trade.try_claim(Side::Buy));
        assert!(!trade.try_claim(Side::Buy));
        assert!(trade.is_claimed_by(Side::Buy));
        assert!(!trade.is_claimed_by(Side::Sell));

        assert!(trade.try_claim(Side::Sell));
        assert!(trade.is_settled());
    }

    #[test]
    fn test_record_rejects_self_trade() {
        let buy = order(Side::Buy, 1);
        let sell = order(Side::Sell, 1);
        let mut record = Trade::between(&buy, &sell, 1, Decimal::from(50), 1).to_record();
        record.seller = record.buyer;

        assert!(matches!(
            Trade::from_record(&record, ItemId::from("emerald")),
            Err(MarketError::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_record_rejects_unrepresentable_notional() {
        let buy = order(Side::Buy, 2);
        let sell = order(Side::Sell, 2);
        let mut record = Trade::between(&buy, &sell, 2, Decimal::from(50), 1).to_record();
        record.price = Decimal::MAX;

        assert!(matches!(
            Trade::from_record(&record, ItemId::from("emerald")),
            Err(MarketError::CorruptRecord(_))
        ));

        record.amount = 1;
        let trade = Trade::from_record(&record, ItemId::from("emerald")).unwrap();
        assert_eq!(trade.notional_value(), Decimal::MAX);
    }
}
