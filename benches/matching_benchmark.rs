// ============================================================================
// Market Engine Benchmarks
// ============================================================================
//
// Benchmark Categories:
// 1. Full Matching - End-to-end order submission and matching through a book
// 2. Self-Trade Skipping - Matching past a wall of the taker's own orders
// 3. Settlement - Claiming many small fills
// 4. Order Book Operations - Snapshot, quote and no-match submission
// 5. Registry - Submissions spread over several items from several threads
// ============================================================================

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use market_engine::prelude::*;
use rust_decimal::Decimal;
use std::hint::black_box;

const ITEM: &str = "diamond";

fn limit(owner: OwnerId, side: Side, price: i64, volume: Volume) -> OrderRequest {
    OrderRequest::limit(owner, ITEM, side, Decimal::from(price), volume)
}

// ============================================================================
// Full Matching Benchmarks
// ============================================================================

fn benchmark_price_time_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_time_matching");

    for num_orders in [100i64, 1000, 10000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_orders),
            num_orders,
            |b, &num_orders| {
                let book = OrderBook::new(ITEM);

                // Pre-populate the book with sell orders at different prices
                for i in 0..num_orders / 2 {
                    book.submit(limit(OwnerId::new(), Side::Sell, 500 + i, 1_000_000))
                        .unwrap();
                }

                let taker = OwnerId::new();
                b.iter(|| {
                    // Buy order that crosses the best price level
                    black_box(book.submit(limit(taker, Side::Buy, 505, 1)).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn benchmark_market_order_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_order_sweep");

    for levels in [5u64, 50, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(levels), levels, |b, &levels| {
            b.iter_batched(
                || {
                    let book = OrderBook::new(ITEM);
                    for i in 0..levels as i64 {
                        book.submit(limit(OwnerId::new(), Side::Sell, 100 + i, 1)).unwrap();
                    }
                    book
                },
                |book| {
                    black_box(
                        book.submit(OrderRequest::market(OwnerId::new(), ITEM, Side::Buy, levels))
                            .unwrap(),
                    )
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Self-Trade Skipping
// ============================================================================

fn benchmark_self_trade_skip(c: &mut Criterion) {
    let mut group = c.benchmark_group("self_trade_skip");

    for own_orders in [10i64, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(own_orders),
            own_orders,
            |b, &own_orders| {
                let book = OrderBook::new(ITEM);
                let taker = OwnerId::new();

                // The taker's own asks sit in front of the only foreign liquidity
                for i in 0..own_orders {
                    book.submit(limit(taker, Side::Sell, 100 + i % 10, 1)).unwrap();
                }
                book.submit(limit(OwnerId::new(), Side::Sell, 200, u64::MAX / 2))
                    .unwrap();

                b.iter(|| {
                    black_box(book.submit(limit(taker, Side::Buy, 200, 1)).unwrap());
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Settlement
// ============================================================================

fn benchmark_claim(c: &mut Criterion) {
    let mut group = c.benchmark_group("claim");

    for fills in [1u64, 16, 256].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(fills), fills, |b, &fills| {
            b.iter_batched(
                || {
                    let book = OrderBook::new(ITEM);
                    let maker = book.submit(limit(OwnerId::new(), Side::Sell, 10, fills)).unwrap();
                    for _ in 0..fills {
                        book.submit(limit(OwnerId::new(), Side::Buy, 10, 1)).unwrap();
                    }
                    (book, maker.order.id)
                },
                |(book, order_id)| black_box(book.claim(order_id).unwrap()),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Order Book Operations
// ============================================================================

fn populated_book() -> OrderBook {
    let book = OrderBook::new(ITEM);

    // Pre-populate book with 100 levels on each side
    for i in 0..100 {
        book.submit(limit(OwnerId::new(), Side::Buy, 4990 - i * 10, 1)).unwrap();
        book.submit(limit(OwnerId::new(), Side::Sell, 5010 + i * 10, 1)).unwrap();
    }
    book
}

fn benchmark_order_book_snapshot(c: &mut Criterion) {
    c.bench_function("order_book_snapshot", |b| {
        let book = populated_book();

        b.iter(|| {
            black_box(book.snapshot(10));
        });
    });
}

fn benchmark_quote(c: &mut Criterion) {
    c.bench_function("quote_excluding_viewer", |b| {
        let book = populated_book();
        let viewer = OwnerId::new();

        b.iter(|| {
            black_box(book.quote(Some(&viewer)));
        });
    });
}

fn benchmark_order_submission_no_match(c: &mut Criterion) {
    c.bench_function("order_submission_no_match", |b| {
        let book = OrderBook::new(ITEM);
        let owner = OwnerId::new();

        b.iter(|| {
            // Submit order that won't match (empty book on other side)
            black_box(book.submit(limit(owner, Side::Sell, 500, 1)).unwrap());
        });
    });
}

// ============================================================================
// Registry
// ============================================================================

fn benchmark_registry_parallel_items(c: &mut Criterion) {
    let items = ["diamond", "emerald", "gold", "iron"];

    c.bench_function("registry_parallel_items", |b| {
        let market = MarketRegistryBuilder::new()
            .with_catalog(items)
            .build()
            .unwrap();

        b.iter(|| {
            crossbeam::scope(|scope| {
                for (i, item) in items.iter().enumerate() {
                    let market = &market;
                    scope.spawn(move |_| {
                        let owner = OwnerId::new();
                        for round in 0..100i64 {
                            let side = if (i as i64 + round) % 2 == 0 { Side::Buy } else { Side::Sell };
                            let request =
                                OrderRequest::limit(owner, *item, side, Decimal::from(10 + round % 5), 1);
                            black_box(market.submit(request).unwrap());
                        }
                    });
                }
            })
            .unwrap();
        });
    });
}

criterion_group!(
    benches,
    benchmark_price_time_matching,
    benchmark_market_order_sweep,
    benchmark_self_trade_skip,
    benchmark_claim,
    benchmark_order_book_snapshot,
    benchmark_quote,
    benchmark_order_submission_no_match,
    benchmark_registry_parallel_items,
);
criterion_main!(benches);
