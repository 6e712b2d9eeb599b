// ============================================================================
// Event Handler Interface
// Defines the contract for handling market events
// ============================================================================

use crate::domain::{ItemId, OrderId, OrderKind, OwnerId, Price, Side, Trade, Volume};
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Events emitted by books and the registry, consumed by the notification layer
#[derive(Debug, Clone)]
pub enum MarketEvent {
    /// Order passed validation and admission
    OrderAccepted {
        order_id: OrderId,
        owner: OwnerId,
        item: ItemId,
        side: Side,
        kind: OrderKind,
        volume: Volume,
        timestamp: DateTime<Utc>,
    },

    /// Order matched, trade generated
    TradeExecuted {
        trade: Arc<Trade>,
        timestamp: DateTime<Utc>,
    },

    /// Order fully filled
    OrderFilled {
        order_id: OrderId,
        item: ItemId,
        timestamp: DateTime<Utc>,
    },

    /// Order cancelled; `remaining` is owed back to the owner
    OrderCancelled {
        order_id: OrderId,
        item: ItemId,
        remaining: Volume,
        timestamp: DateTime<Utc>,
    },

    /// Order resting in the book
    OrderAddedToBook {
        order_id: OrderId,
        item: ItemId,
        price: Price,
        remaining: Volume,
        timestamp: DateTime<Utc>,
    },

    /// Settlement collected for one side of some trades
    TradesClaimed {
        order_id: OrderId,
        owner: OwnerId,
        side: Side,
        units: Volume,
        proceeds: Decimal,
        timestamp: DateTime<Utc>,
    },

    MarketOpened {
        timestamp: DateTime<Utc>,
    },

    MarketClosed {
        timestamp: DateTime<Utc>,
    },

    /// All resting orders of a book were cancelled and its statistics zeroed
    BookReset {
        item: ItemId,
        cancelled: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Event handler trait for processing market events
/// Implementations can handle logging, notifications, etc.
pub trait EventHandler: Send + Sync {
    /// Handle a market event
    fn on_event(&self, event: MarketEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<MarketEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: MarketEvent) {
        // Do nothing
    }
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: MarketEvent) {
        tracing::debug!("Market event: {:?}", event);
    }
}

/// Buffers events for a consumer on another thread (chat notifications, sounds, ...).
#[derive(Default)]
pub struct BufferedEventHandler {
    queue: SegQueue<MarketEvent>,
}

impl BufferedEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&self) -> Vec<MarketEvent> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.queue.pop() {
            events.push(event);
        }
        events
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl EventHandler for BufferedEventHandler {
    fn on_event(&self, event: MarketEvent) {
        self.queue.push(event);
    }
}
