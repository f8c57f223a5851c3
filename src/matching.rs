//! Matching Engine - Core order matching algorithm.
//!
//! Implements the cross/rest algorithm:
//! 1. CROSSING: Match the incoming order against the opposite book
//! 2. RESTING: Place any remaining quantity in its own book
//!
//! Trades always print at the resting order's price.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::OrderError;
use crate::order::{Execution, Order, OrderId, Side};
use crate::order_book::OrderBook;
use crate::price::Price;

/// The matching engine core
pub struct MatchingEngine {
    /// Resting buy orders
    buy_book: OrderBook,
    /// Resting sell orders
    sell_book: OrderBook,
    /// IDs of resting orders (for duplicate detection)
    resting: FxHashMap<OrderId, Side>,
    /// Next execution ID to hand out
    next_execution_id: u64,
    /// Creation time of the last accepted order
    last_created_at: Option<DateTime<Utc>>,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a matching engine with room for `capacity` resting orders per side
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buy_book: OrderBook::with_capacity(Side::Buy, capacity),
            sell_book: OrderBook::with_capacity(Side::Sell, capacity),
            resting: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            next_execution_id: 1,
            last_created_at: None,
        }
    }

    /// Process an incoming order.
    ///
    /// # Algorithm
    /// 1. Validate (nothing is touched if this fails)
    /// 2. Cross against the opposite book while prices are compatible
    /// 3. Rest any remaining quantity in the order's own book
    ///
    /// # Returns
    /// The executions generated, in fill order
    pub fn process_order(&mut self, mut order: Order) -> Result<Vec<Execution>, OrderError> {
        self.validate(&order)?;
        self.last_created_at = Some(order.created_at);

        let mut executions = Vec::new();

        // Phase 1: CROSSING
        self.cross_order(&mut order, &mut executions);

        // Phase 2: RESTING
        if order.qty > 0 {
            self.rest_order(order)?;
        }

        Ok(executions)
    }

    fn validate(&self, order: &Order) -> Result<(), OrderError> {
        if order.qty == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        if order.price.ticks() == 0 {
            return Err(OrderError::InvalidPrice("price must be positive".into()));
        }
        if let Some(last) = self.last_created_at {
            if order.created_at < last {
                return Err(OrderError::NonMonotonicTime {
                    order_id: order.order_id.clone(),
                    created_at: order.created_at,
                    last,
                });
            }
        }
        if self.resting.contains_key(&order.order_id) {
            return Err(OrderError::DuplicateOrderId(order.order_id.clone()));
        }
        Ok(())
    }

    /// Match `incoming` against the opposite book until it is filled or
    /// no longer marketable.
    fn cross_order(&mut self, incoming: &mut Order, executions: &mut Vec<Execution>) {
        let opposite = match incoming.side {
            Side::Buy => &mut self.sell_book,
            Side::Sell => &mut self.buy_book,
        };
        let resting_index = &mut self.resting;

        while incoming.qty > 0 && opposite.can_match(incoming.price) {
            let Some(mut maker) = opposite.pop_resting() else {
                unreachable!("{} book reported a match but had nothing to pop", opposite.side());
            };

            let trade_qty = incoming.qty.min(maker.order.qty);
            let price = maker.order.price;

            let execution_id = self.next_execution_id;
            self.next_execution_id += 1;

            let (buy_order_id, sell_order_id) = match incoming.side {
                Side::Buy => (incoming.order_id.clone(), maker.order.order_id.clone()),
                Side::Sell => (maker.order.order_id.clone(), incoming.order_id.clone()),
            };

            debug!(
                execution_id,
                %price,
                qty = trade_qty,
                buy = %buy_order_id,
                sell = %sell_order_id,
                "execution"
            );

            executions.push(Execution {
                execution_id,
                price,
                qty: trade_qty,
                buy_order_id,
                sell_order_id,
            });

            incoming.qty -= trade_qty;
            maker.order.qty -= trade_qty;

            if maker.order.qty > 0 {
                // Keeps its original time and sequence
                if let Err(e) = opposite.restore(maker) {
                    unreachable!("partially filled order could not be restored: {e}");
                }
            } else {
                resting_index.remove(&maker.order.order_id);
            }
        }
    }

    /// Rest an order in its own book (passive posting).
    fn rest_order(&mut self, order: Order) -> Result<(), OrderError> {
        debug!(order_id = %order.order_id, side = %order.side, price = %order.price, qty = order.qty, "resting");

        let (order_id, side) = (order.order_id.clone(), order.side);
        self.book_mut(side).add(order)?;
        self.resting.insert(order_id, side);
        Ok(())
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// The book holding orders of `side`
    #[inline]
    pub fn book(&self, side: Side) -> &OrderBook {
        match side {
            Side::Buy => &self.buy_book,
            Side::Sell => &self.sell_book,
        }
    }

    #[inline]
    fn book_mut(&mut self, side: Side) -> &mut OrderBook {
        match side {
            Side::Buy => &mut self.buy_book,
            Side::Sell => &mut self.sell_book,
        }
    }

    /// Best resting order on `side`
    #[inline]
    pub fn peek_best(&self, side: Side) -> Option<&Order> {
        self.book(side).peek()
    }

    /// True if nothing rests on `side`
    #[inline]
    pub fn is_empty(&self, side: Side) -> bool {
        self.book(side).is_empty()
    }

    /// Get the best bid price
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.buy_book.best_price()
    }

    /// Get the best ask price
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.sell_book.best_price()
    }

    /// Spread in ticks, if both sides are populated and uncrossed
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask.ticks() - bid.ticks()),
            _ => None,
        }
    }

    /// Total resting orders across both books
    #[inline]
    pub fn order_count(&self) -> usize {
        self.buy_book.len() + self.sell_book.len()
    }

    /// Number of executions generated so far
    #[inline]
    pub fn execution_count(&self) -> u64 {
        self.next_execution_id - 1
    }

    /// Pre-size both books for `orders` more resting orders
    pub fn reserve(&mut self, orders: usize) {
        self.buy_book.reserve(orders);
        self.sell_book.reserve(orders);
        self.resting.reserve(orders);
    }

    /// Compute a hash of the current state (for determinism testing)
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.best_bid().hash(&mut hasher);
        self.best_ask().hash(&mut hasher);

        self.buy_book.len().hash(&mut hasher);
        self.sell_book.len().hash(&mut hasher);
        self.buy_book.total_qty().hash(&mut hasher);
        self.sell_book.total_qty().hash(&mut hasher);
        self.execution_count().hash(&mut hasher);

        hasher.finish()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MatchingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingEngine")
            .field("buy_book", &self.buy_book)
            .field("sell_book", &self.sell_book)
            .field("next_execution_id", &self.next_execution_id)
            .finish()
    }
}
