// ============================================================================
// Market Engine Library
// Per-item order books with price-time priority matching
// ============================================================================

//! # Market Engine
//!
//! Order matching for a virtual marketplace: participants post buy and sell orders
//! for catalog items, crossing orders trade at the resting order's price, and each
//! side of a trade later claims its settlement.
//!
//! ## Features
//!
//! - **One lock per item**: every book serializes its own submits, cancels and claims
//! - **Price-time priority** with self-trade prevention
//! - **Two-sided settlement**: buyers claim goods and sellers claim proceeds independently
//! - **Refunds of the unfilled remainder** for cancelled and market orders
//! - **Market events and participant profiles** delivered outside the book lock
//!
//! ## Example
//!
//! ```rust
//! use market_engine::prelude::*;
//! use rust_decimal::Decimal;
//!
//! let market = MarketRegistryBuilder::new()
//!     .with_catalog(["diamond"])
//!     .build()
//!     .unwrap();
//!
//! let seller = OwnerId::new();
//! let buyer = OwnerId::new();
//!
//! market
//!     .submit(OrderRequest::limit(seller, "diamond", Side::Sell, Decimal::from(5), 10))
//!     .unwrap();
//! let bought = market
//!     .submit(OrderRequest::limit(buyer, "diamond", Side::Buy, Decimal::from(6), 4))
//!     .unwrap();
//!
//! // Executed at the seller's price
//! assert_eq!(bought.trades[0].price, Decimal::from(5));
//!
//! let settlement = market.claim(&ItemId::from("diamond"), bought.order.id).unwrap();
//! assert_eq!(settlement.units, 4);
//!
//! let snapshot = market.snapshot(&ItemId::from("diamond"), 10).unwrap();
//! println!("Best ask: {:?}", snapshot.best_ask());
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod ledger;
pub mod utils;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::order::state::{OrderStatus, OrderTransition};
    pub use crate::domain::{
        BookRecord, BookStats, ItemId, MarketConfig, MarketError, MarketResult, Order,
        OrderBookSnapshot, OrderId, OrderKind, OrderRequest, OwnerId, Price, PriceQuote, Refund,
        Settlement, Side, Trade, TradeId, Volume,
    };
    pub use crate::engine::{
        create_from_config, BookContext, MarketRegistry, MarketRegistryBuilder, OrderBook,
        PriceTimePriority, Submission,
    };
    pub use crate::interfaces::{
        AdmissionCheck, BufferedEventHandler, EventHandler, LedgerEvent, LoggingEventHandler,
        MarketEvent, MatchingAlgorithm, NoOpEventHandler, ProfileLedger,
    };
    pub use crate::ledger::{InMemoryProfileLedger, MarketProfile};
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    const ITEM: &str = "diamond";

    fn market() -> MarketRegistry {
        MarketRegistryBuilder::new().build().unwrap()
    }

    fn item() -> ItemId {
        ItemId::from(ITEM)
    }

    #[test]
    fn test_sell_order_rests_in_empty_book() {
        let market = market();
        let sell = market
            .submit(OrderRequest::limit(OwnerId::new(), ITEM, Side::Sell, Decimal::from(5), 10))
            .unwrap();

        assert!(sell.trades.is_empty());
        let book = market.book(&item()).unwrap();
        assert_eq!(book.best_sell_price(None), Some(Decimal::from(5)));
        assert_eq!(book.resting_orders(), 1);
        assert_eq!(book.stats().trades, 0);
    }

    #[test]
    fn test_equal_orders_fill_each_other() {
        let market = market();
        let sell = market
            .submit(OrderRequest::limit(OwnerId::new(), ITEM, Side::Sell, Decimal::from(5), 10))
            .unwrap();
        let buy = market
            .submit(OrderRequest::limit(OwnerId::new(), ITEM, Side::Buy, Decimal::from(5), 10))
            .unwrap();

        assert_eq!(buy.trades.len(), 1);
        assert_eq!(buy.trades[0].amount, 10);
        assert_eq!(buy.trades[0].price, Decimal::from(5));
        assert_eq!(buy.order.status(), OrderStatus::Filled);
        assert_eq!(
            market.order(&item(), sell.order.id).unwrap().status(),
            OrderStatus::Filled
        );

        let snapshot = market.snapshot(&item(), 10).unwrap();
        assert!(snapshot.bids.is_empty());
        assert!(snapshot.asks.is_empty());
    }

    #[test]
    fn test_partial_fill_at_maker_price() {
        let market = market();
        let sell = market
            .submit(OrderRequest::limit(OwnerId::new(), ITEM, Side::Sell, Decimal::from(10), 5))
            .unwrap();
        let buy = market
            .submit(OrderRequest::limit(OwnerId::new(), ITEM, Side::Buy, Decimal::from(12), 3))
            .unwrap();

        assert_eq!(buy.trades.len(), 1);
        assert_eq!(buy.trades[0].amount, 3);
        assert_eq!(buy.trades[0].price, Decimal::from(10));
        assert_eq!(buy.order.status(), OrderStatus::Filled);

        let resting = market.order(&item(), sell.order.id).unwrap();
        assert_eq!(resting.status(), OrderStatus::PartiallyFilled);
        assert_eq!(resting.remaining_volume(), 2);
        assert_eq!(
            market.snapshot(&item(), 1).unwrap().asks,
            vec![(Decimal::from(10), 2)]
        );
    }

    #[test]
    fn test_market_order_into_empty_book() {
        let market = market();
        let submission = market
            .submit(OrderRequest::market(OwnerId::new(), ITEM, Side::Buy, 4))
            .unwrap();

        assert!(submission.trades.is_empty());
        assert_eq!(submission.order.status(), OrderStatus::Cancelled);
        let refund = submission.refund().unwrap();
        assert_eq!(refund.volume, 4);
        assert_eq!(refund.currency, None);
        assert_eq!(market.book(&item()).unwrap().resting_orders(), 0);
    }

    #[test]
    fn test_cancel_refunds_remainder_only() {
        let market = market();
        let seller = market
            .submit(OrderRequest::limit(OwnerId::new(), ITEM, Side::Sell, Decimal::from(8), 5))
            .unwrap();
        market
            .submit(OrderRequest::limit(OwnerId::new(), ITEM, Side::Buy, Decimal::from(8), 2))
            .unwrap();

        let cancelled = market.cancel(&item(), seller.order.id).unwrap();
        let refund = cancelled.refund().unwrap();

        assert_eq!(refund.volume, 3);
        assert_eq!(refund.goods(), 3);
        // The two units already sold are still claimable as proceeds.
        let settlement = market.claim(&item(), seller.order.id).unwrap();
        assert_eq!(settlement.proceeds, Decimal::from(16));
    }

    #[test]
    fn test_full_trading_session() {
        let events = Arc::new(BufferedEventHandler::new());
        let profiles = Arc::new(InMemoryProfileLedger::new());
        let market = MarketRegistryBuilder::new()
            .with_catalog(["diamond", "emerald"])
            .with_event_handler(events.clone())
            .with_profiles(profiles.clone())
            .build()
            .unwrap();

        let alice = OwnerId::new();
        let bob = OwnerId::new();

        // Alice's own ask is skipped; Bob's is taken at his price.
        market
            .submit(OrderRequest::limit(alice, ITEM, Side::Sell, Decimal::from(4), 2))
            .unwrap();
        market
            .submit(OrderRequest::limit(bob, ITEM, Side::Sell, Decimal::from(5), 2))
            .unwrap();
        let alice_buy = market
            .submit(OrderRequest::limit(alice, ITEM, Side::Buy, Decimal::from(6), 3))
            .unwrap();

        assert_eq!(alice_buy.trades.len(), 1);
        assert_eq!(alice_buy.trades[0].seller, bob);
        assert_eq!(alice_buy.order.remaining_volume(), 1);

        let quote = market.quote(&item(), Some(&alice)).unwrap();
        assert_eq!(quote.best_sell, None);
        assert_eq!(quote.best_buy, None);
        assert_eq!(quote.sell_orders, 1);

        market.claim(&item(), alice_buy.order.id).unwrap();
        let alice_profile = profiles.profile(&alice);
        assert_eq!(alice_profile.orders_made(), 2);
        assert_eq!(alice_profile.items_bought, 2);
        assert_eq!(alice_profile.money_spent, Decimal::from(10));
        assert_eq!(profiles.profile(&bob).money_gained, Decimal::from(10));

        let cancelled = market.reset(None);
        assert_eq!(cancelled.len(), 2);
        assert!(market.orders_of(&alice).is_empty());
        assert_eq!(market.market_stats(), BookStats::default());

        assert!(events
            .drain()
            .iter()
            .any(|event| matches!(event, MarketEvent::BookReset { cancelled: 2, .. })));
    }
}
