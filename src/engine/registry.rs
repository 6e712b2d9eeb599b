// ============================================================================
// Market Registry
// Item -> order book routing and the market-wide admission gate
// ============================================================================

use crate::domain::{
    BookRecord, BookStats, ItemId, MarketConfig, MarketError, MarketResult, Order,
    OrderBookSnapshot, OrderId, OrderRequest, OwnerId, PriceQuote, Settlement,
};
use crate::engine::{BookContext, OrderBook, Submission};
use crate::interfaces::{AdmissionCheck, MarketEvent, MatchingAlgorithm};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The market: one [`OrderBook`] per item, created on first use and never removed.
///
/// Built once at startup (see [`MarketRegistryBuilder`](crate::engine::MarketRegistryBuilder))
/// and shared by reference. Every book gets the same gate, sequencers, event handler
/// and ledger, so trade sequences are global across items.
pub struct MarketRegistry {
    config: MarketConfig,
    algorithm: Arc<dyn MatchingAlgorithm>,
    context: BookContext,
    admission: Option<Arc<dyn AdmissionCheck>>,
    books: RwLock<HashMap<ItemId, Arc<OrderBook>>>,
}

impl MarketRegistry {
    pub(crate) fn from_parts(
        config: MarketConfig,
        algorithm: Arc<dyn MatchingAlgorithm>,
        context: BookContext,
        admission: Option<Arc<dyn AdmissionCheck>>,
    ) -> Self {
        info!(
            algorithm = algorithm.name(),
            open = context.gate.is_open(),
            catalog = config.catalog.as_ref().map(|catalog| catalog.len()),
            "market registry created"
        );

        Self {
            config,
            algorithm,
            context,
            admission,
            books: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    // ========================================================================
    // Admission Gate
    // ========================================================================

    /// Open the market. Returns true if it was closed before.
    pub fn open(&self) -> bool {
        let changed = self.context.gate.open();
        if changed {
            info!("market opened");
            self.context.events.on_event(MarketEvent::MarketOpened {
                timestamp: Utc::now(),
            });
        }
        changed
    }

    /// Close the market to new orders. Cancels and claims keep working.
    /// Returns true if it was open before.
    pub fn close(&self) -> bool {
        let changed = self.context.gate.close();
        if changed {
            info!("market closed");
            self.context.events.on_event(MarketEvent::MarketClosed {
                timestamp: Utc::now(),
            });
        }
        changed
    }

    pub fn is_open(&self) -> bool {
        self.context.gate.is_open()
    }

    // ========================================================================
    // Books
    // ========================================================================

    /// The book for `item`, created if this is its first use.
    pub fn book_for(&self, item: &ItemId) -> MarketResult<Arc<OrderBook>> {
        if let Some(book) = self.books.read().get(item) {
            return Ok(Arc::clone(book));
        }

        if !self.config.allows(item) {
            return Err(MarketError::UnknownItem(item.clone()));
        }

        let mut books = self.books.write();
        let book = books.entry(item.clone()).or_insert_with(|| {
            debug!(%item, "order book created");
            Arc::new(OrderBook::with_context(
                item.clone(),
                Arc::clone(&self.algorithm),
                self.context.clone(),
            ))
        });
        Ok(Arc::clone(book))
    }

    /// The book for `item` if one exists.
    pub fn book(&self, item: &ItemId) -> Option<Arc<OrderBook>> {
        self.books.read().get(item).cloned()
    }

    /// Items that have a book, sorted.
    pub fn items(&self) -> Vec<ItemId> {
        let mut items: Vec<ItemId> = self.books.read().keys().cloned().collect();
        items.sort();
        items
    }

    // ========================================================================
    // Routing
    // ========================================================================

    pub fn submit(&self, request: OrderRequest) -> MarketResult<Submission> {
        if let Some(admission) = &self.admission {
            if admission.is_restricted(&request.owner) {
                warn!(owner = %request.owner, item = %request.item, "restricted participant tried to trade");
                return Err(MarketError::Restricted(request.owner));
            }
        }

        self.book_for(&request.item)?.submit(request)
    }

    pub fn cancel(&self, item: &ItemId, order_id: OrderId) -> MarketResult<Order> {
        self.existing_book(item, order_id)?.cancel(order_id)
    }

    pub fn claim(&self, item: &ItemId, order_id: OrderId) -> MarketResult<Settlement> {
        self.existing_book(item, order_id)?.claim(order_id)
    }

    pub fn order(&self, item: &ItemId, order_id: OrderId) -> Option<Order> {
        self.book(item).and_then(|book| book.order(order_id))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Prices of `item` as `viewer` sees them; their own orders do not count as
    /// the best price.
    pub fn quote(&self, item: &ItemId, viewer: Option<&OwnerId>) -> MarketResult<PriceQuote> {
        match self.book(item) {
            Some(book) => Ok(book.quote(viewer)),
            None if self.config.allows(item) => Ok(PriceQuote {
                item: item.clone(),
                best_buy: None,
                best_sell: None,
                buy_orders: 0,
                sell_orders: 0,
            }),
            None => Err(MarketError::UnknownItem(item.clone())),
        }
    }

    pub fn snapshot(&self, item: &ItemId, depth: usize) -> Option<OrderBookSnapshot> {
        self.book(item).map(|book| book.snapshot(depth))
    }

    /// Open orders of `owner` across every book, grouped by item.
    pub fn orders_of(&self, owner: &OwnerId) -> Vec<Order> {
        self.sorted_books()
            .iter()
            .flat_map(|book| book.orders_of(owner))
            .collect()
    }

    /// Statistics of every book merged together.
    pub fn market_stats(&self) -> BookStats {
        self.sorted_books()
            .iter()
            .fold(BookStats::default(), |mut total, book| {
                total.merge(&book.stats());
                total
            })
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Cancel every resting order of one item, or of all items, and zero the book
    /// statistics. The returned orders carry the refunds to pay out.
    pub fn reset(&self, item: Option<&ItemId>) -> Vec<Order> {
        let books = match item {
            Some(item) => self.book(item).into_iter().collect(),
            None => self.sorted_books(),
        };

        let cancelled: Vec<Order> = books.iter().flat_map(|book| book.reset()).collect();
        info!(
            item = item.map(ItemId::as_str),
            books = books.len(),
            cancelled = cancelled.len(),
            "market reset"
        );
        cancelled
    }

    /// Zero the ledger statistics of one participant, or of everyone.
    pub fn reset_participant(&self, owner: Option<&OwnerId>) {
        self.context.ledger.reset(owner);
        match owner {
            Some(owner) => info!(%owner, "participant statistics reset"),
            None => info!("all participant statistics reset"),
        }
    }

    /// Drop fully settled terminal orders from every book. See
    /// [`OrderBook::prune_settled`].
    pub fn prune_settled(&self) -> usize {
        let pruned: usize = self
            .sorted_books()
            .iter()
            .map(|book| book.prune_settled())
            .sum();
        info!(pruned, "settled orders pruned");
        pruned
    }

    // ========================================================================
    // Persistence and Shutdown
    // ========================================================================

    pub fn export(&self) -> Vec<BookRecord> {
        self.sorted_books().iter().map(|book| book.export()).collect()
    }

    /// Load books exported by a previous run. Fails without loading anything if a
    /// record is corrupt, names an item outside the catalog, or an item already has a
    /// book.
    pub fn restore(&self, records: Vec<BookRecord>) -> MarketResult<()> {
        let mut restored = Vec::with_capacity(records.len());
        for record in records {
            if !self.config.allows(&record.item) {
                return Err(MarketError::UnknownItem(record.item));
            }
            restored.push(OrderBook::restore(
                record,
                Arc::clone(&self.algorithm),
                self.context.clone(),
            )?);
        }

        let mut books = self.books.write();
        if let Some(book) = restored.iter().find(|book| books.contains_key(book.item())) {
            return Err(MarketError::CorruptRecord(format!(
                "a book for {} already exists",
                book.item()
            )));
        }

        let count = restored.len();
        for book in restored {
            books.insert(book.item().clone(), Arc::new(book));
        }
        info!(books = count, "market restored");
        Ok(())
    }

    /// Close the gate and hand back every book's record for the store.
    pub fn shutdown(self) -> Vec<BookRecord> {
        self.close();
        let records = self.export();
        info!(books = records.len(), "market registry shut down");
        records
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    fn existing_book(&self, item: &ItemId, order_id: OrderId) -> MarketResult<Arc<OrderBook>> {
        match self.book(item) {
            Some(book) => Ok(book),
            None if self.config.allows(item) => Err(MarketError::NotFound(order_id)),
            None => Err(MarketError::UnknownItem(item.clone())),
        }
    }

    /// Books in item order. Taken out of the map first so no book lock is ever
    /// acquired while the registry lock is held.
    fn sorted_books(&self) -> Vec<Arc<OrderBook>> {
        let mut books: Vec<Arc<OrderBook>> = self.books.read().values().cloned().collect();
        books.sort_by(|a, b| a.item().cmp(b.item()));
        books
    }
}
