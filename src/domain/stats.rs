// ============================================================================
// Book Statistics
// ============================================================================

use super::order::{Price, Volume};
use super::trade::Trade;
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Running totals for one book, or for the whole market once merged.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookStats {
    pub orders_placed: u64,
    pub orders_cancelled: u64,
    pub trades: u64,
    pub volume_traded: Volume,
    /// Sum of price * amount over all trades; saturates at `Decimal::MAX`
    pub turnover: Decimal,
}

impl BookStats {
    pub(crate) fn record_order(&mut self) {
        self.orders_placed += 1;
    }

    pub(crate) fn record_cancel(&mut self) {
        self.orders_cancelled += 1;
    }

    pub(crate) fn record_trade(&mut self, trade: &Trade) {
        self.trades += 1;
        self.volume_traded = self.volume_traded.saturating_add(trade.amount);
        self.turnover = self.turnover.saturating_add(trade.notional_value());
    }

    pub fn merge(&mut self, other: &BookStats) {
        self.orders_placed += other.orders_placed;
        self.orders_cancelled += other.orders_cancelled;
        self.trades += other.trades;
        self.volume_traded = self.volume_traded.saturating_add(other.volume_traded);
        self.turnover = self.turnover.saturating_add(other.turnover);
    }

    /// Volume-weighted average execution price.
    pub fn average_price(&self) -> Option<Price> {
        if self.volume_traded == 0 {
            return None;
        }
        Some(self.turnover / Decimal::from(self.volume_traded))
    }
}
