// ============================================================================
// Basic Usage Example
// ============================================================================

use market_engine::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() {
    println!("=== Market Engine Example ===\n");

    let events = Arc::new(BufferedEventHandler::new());
    let profiles = Arc::new(InMemoryProfileLedger::new());
    let market = MarketRegistryBuilder::new()
        .with_catalog(["diamond", "emerald"])
        .with_event_handler(events.clone())
        .with_profiles(profiles.clone())
        .build()
        .expect("valid market configuration");

    let diamond = ItemId::from("diamond");
    println!("Created market for {}\n", diamond);

    // Add sell orders at different prices
    println!("Adding sell orders...");
    for i in 0i64..5 {
        market
            .submit(OrderRequest::limit(
                OwnerId::new(),
                diamond.clone(),
                Side::Sell,
                Decimal::from(50 + i),
                2,
            ))
            .expect("sell order accepted");
    }

    // Add buy orders
    println!("Adding buy orders...");
    for i in 0i64..5 {
        market
            .submit(OrderRequest::limit(
                OwnerId::new(),
                diamond.clone(),
                Side::Buy,
                Decimal::from(49 - i),
                2,
            ))
            .expect("buy order accepted");
    }

    // Get order book snapshot
    println!("\n=== Order Book Snapshot ===");
    let snapshot = market.snapshot(&diamond, 5).expect("book exists");

    println!("\nBids:");
    for (price, volume) in &snapshot.bids {
        println!("  {} @ {}", volume, price);
    }

    println!("\nAsks:");
    for (price, volume) in &snapshot.asks {
        println!("  {} @ {}", volume, price);
    }

    println!("\nSpread: {:?}", snapshot.spread);
    println!("Mid Price: {:?}", snapshot.mid_price);

    // Submit a market buy order that sweeps the cheapest asks
    println!("\n=== Submitting Market Order ===");
    let buyer = OwnerId::new();
    let submission = market
        .submit(OrderRequest::market(buyer, diamond.clone(), Side::Buy, 5))
        .expect("market order accepted");

    for trade in &submission.trades {
        println!(
            "  Trade: {} @ {} (amount: {})",
            trade.id, trade.price, trade.amount
        );
    }
    if let Some(refund) = submission.refund() {
        println!("  Unfilled, refunded: {}", refund.volume);
    }

    let settlement = market
        .claim(&diamond, submission.order.id)
        .expect("order exists");
    println!("  Claimed {} {}", settlement.units, diamond);

    println!("\nEvents generated:");
    for event in events.drain() {
        match event {
            MarketEvent::TradeExecuted { trade, .. } => {
                println!("  Trade {} executed", trade.id);
            },
            MarketEvent::OrderFilled { order_id, .. } => {
                println!("  Order {} filled", order_id);
            },
            _ => {},
        }
    }

    let profile = profiles.profile(&buyer);
    println!(
        "\nBuyer bought {} for {} over {} trades",
        profile.items_bought, profile.money_spent, profile.trades_made
    );

    // Final snapshot
    println!("\n=== Final Order Book ===");
    let final_snapshot = market.snapshot(&diamond, 10).expect("book exists");
    println!("Bids: {} levels", final_snapshot.bids.len());
    println!("Asks: {} levels", final_snapshot.asks.len());
    println!("Spread: {:?}", final_snapshot.spread);

    let records = market.shutdown();
    println!("\nShut down with {} book(s) to persist", records.len());
}
