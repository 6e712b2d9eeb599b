// ============================================================================
// In-Memory Profile Ledger
// Per-participant market statistics and trading restrictions
// ============================================================================

use crate::domain::{OrderId, OwnerId, Side, TradeId, Volume};
use crate::interfaces::{AdmissionCheck, LedgerEvent, ProfileLedger};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Market activity of one participant.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarketProfile {
    pub buy_orders_made: u64,
    pub sell_orders_made: u64,
    pub trades_made: u64,
    pub money_spent: Decimal,
    pub money_gained: Decimal,
    pub items_bought: Volume,
    pub items_sold: Volume,
    /// Restricted participants cannot place orders
    pub restricted: bool,
}

impl MarketProfile {
    pub fn orders_made(&self) -> u64 {
        self.buy_orders_made + self.sell_orders_made
    }

    pub fn net_money(&self) -> Decimal {
        self.money_gained - self.money_spent
    }

    /// Zero the counters. The restriction is an administrative flag and survives.
    pub fn reset_statistics(&mut self) {
        *self = Self {
            restricted: self.restricted,
            ..Self::default()
        };
    }
}

#[derive(Default)]
struct LedgerState {
    profiles: HashMap<OwnerId, MarketProfile>,
    applied_orders: HashSet<OrderId>,
    applied_trades: HashSet<(TradeId, Side)>,
}

/// [`ProfileLedger`] that keeps every profile in memory.
///
/// Events are applied at most once: order placements per order id, trade executions
/// per (trade id, side).
#[derive(Default)]
pub struct InMemoryProfileLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryProfileLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load previously persisted profiles. Deduplication starts empty.
    pub fn restore(profiles: HashMap<OwnerId, MarketProfile>) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                profiles,
                ..LedgerState::default()
            }),
        }
    }

    /// Profile of `owner`; an empty one if the owner never traded.
    pub fn profile(&self, owner: &OwnerId) -> MarketProfile {
        self.state
            .read()
            .profiles
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    pub fn profiles(&self) -> HashMap<OwnerId, MarketProfile> {
        self.state.read().profiles.clone()
    }

    pub fn set_restricted(&self, owner: OwnerId, restricted: bool) {
        self.state
            .write()
            .profiles
            .entry(owner)
            .or_default()
            .restricted = restricted;
        tracing::info!(%owner, restricted, "participant restriction changed");
    }
}

impl ProfileLedger for InMemoryProfileLedger {
    fn record(&self, event: &LedgerEvent) {
        let mut state = self.state.write();

        match event {
            LedgerEvent::OrderPlaced {
                order_id,
                owner,
                side,
            } => {
                if !state.applied_orders.insert(*order_id) {
                    return;
                }
                let profile = state.profiles.entry(*owner).or_default();
                match side {
                    Side::Buy => profile.buy_orders_made += 1,
                    Side::Sell => profile.sell_orders_made += 1,
                }
            },
            LedgerEvent::TradeExecuted {
                trade_id,
                owner,
                side,
                amount,
                price,
            } => {
                if !state.applied_trades.insert((*trade_id, *side)) {
                    return;
                }
                let notional = price.saturating_mul(Decimal::from(*amount));
                let profile = state.profiles.entry(*owner).or_default();
                profile.trades_made += 1;
                match side {
                    Side::Buy => {
                        profile.items_bought = profile.items_bought.saturating_add(*amount);
                        profile.money_spent = profile.money_spent.saturating_add(notional);
                    },
                    Side::Sell => {
                        profile.items_sold = profile.items_sold.saturating_add(*amount);
                        profile.money_gained = profile.money_gained.saturating_add(notional);
                    },
                }
            },
        }
    }

    fn reset(&self, owner: Option<&OwnerId>) {
        let mut state = self.state.write();
        match owner {
            Some(owner) => {
                if let Some(profile) = state.profiles.get_mut(owner) {
                    profile.reset_statistics();
                }
            },
            None => state
                .profiles
                .values_mut()
                .for_each(MarketProfile::reset_statistics),
        }
    }
}

impl AdmissionCheck for InMemoryProfileLedger {
    fn is_restricted(&self, owner: &OwnerId) -> bool {
        self.state
            .read()
            .profiles
            .get(owner)
            .is_some_and(|profile| profile.restricted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Price;

    fn trade(trade_id: TradeId, owner: OwnerId, side: Side, amount: Volume, price: i64) -> LedgerEvent {
        LedgerEvent::TradeExecuted {
            trade_id,
            owner,
            side,
            amount,
            price: Price::from(price),
        }
    }

    #[test]
    fn test_trades_apply_once_per_side() {
        let ledger = InMemoryProfileLedger::new();
        let buyer = OwnerId::new();
        let seller = OwnerId::new();
        let id = TradeId::new();

        ledger.record_all(&[
            trade(id, buyer, Side::Buy, 3, 7),
            trade(id, seller, Side::Sell, 3, 7),
            trade(id, buyer, Side::Buy, 3, 7),
        ]);

        let bought = ledger.profile(&buyer);
        assert_eq!(bought.trades_made, 1);
        assert_eq!(bought.items_bought, 3);
        assert_eq!(bought.money_spent, Decimal::from(21));

        let sold = ledger.profile(&seller);
        assert_eq!(sold.items_sold, 3);
        assert_eq!(sold.net_money(), Decimal::from(21));
    }

    #[test]
    fn test_order_placements_count_by_side() {
        let ledger = InMemoryProfileLedger::new();
        let owner = OwnerId::new();
        let order_id = OrderId::new();

        ledger.record(&LedgerEvent::OrderPlaced {
            order_id,
            owner,
            side: Side::Sell,
        });
        ledger.record(&LedgerEvent::OrderPlaced {
            order_id,
            owner,
            side: Side::Sell,
        });
        ledger.record(&LedgerEvent::OrderPlaced {
            order_id: OrderId::new(),
            owner,
            side: Side::Buy,
        });

        let profile = ledger.profile(&owner);
        assert_eq!(profile.sell_orders_made, 1);
        assert_eq!(profile.buy_orders_made, 1);
        assert_eq!(profile.orders_made(), 2);
    }

    #[test]
    fn test_reset_keeps_restriction() {
        let ledger = InMemoryProfileLedger::new();
        let owner = OwnerId::new();
        let other = OwnerId::new();
        ledger.record(&trade(TradeId::new(), owner, Side::Buy, 1, 5));
        ledger.record(&trade(TradeId::new(), other, Side::Sell, 1, 5));
        ledger.set_restricted(owner, true);

        ledger.reset(Some(&owner));

        let profile = ledger.profile(&owner);
        assert_eq!(profile.trades_made, 0);
        assert!(profile.restricted);
        assert!(ledger.is_restricted(&owner));
        assert_eq!(ledger.profile(&other).trades_made, 1);

        ledger.reset(None);
        assert_eq!(ledger.profile(&other), MarketProfile::default());
    }

    #[test]
    fn test_unknown_owner_is_unrestricted() {
        let ledger = InMemoryProfileLedger::new();
        let owner = OwnerId::new();

        assert!(!ledger.is_restricted(&owner));
        assert_eq!(ledger.profile(&owner), MarketProfile::default());
        assert!(ledger.profiles().is_empty());
    }

    #[test]
    fn test_restore_profiles() {
        let owner = OwnerId::new();
        let mut profiles = HashMap::new();
        profiles.insert(
            owner,
            MarketProfile {
                sell_orders_made: 4,
                restricted: true,
                ..MarketProfile::default()
            },
        );

        let ledger = InMemoryProfileLedger::restore(profiles);
        assert_eq!(ledger.profile(&owner).sell_orders_made, 4);
        assert!(ledger.is_restricted(&owner));
    }
}
