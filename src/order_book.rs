//! Order Book - One side of the limit order book.
//!
//! Resting orders live in a binary heap ordered best-first:
//! price, then creation time, then insertion sequence. The same type
//! serves both sides; the side is data, not a separate implementation.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::error::OrderError;
use crate::order::{Order, Side};
use crate::price::Price;

/// Heap entry: a resting order plus its precomputed priority key.
#[derive(Debug)]
struct BookEntry {
    /// Price rank; lower is better. Sell: ticks. Buy: `!ticks`.
    rank: u64,
    created_at: DateTime<Utc>,
    sequence: u64,
    order: Order,
}

impl BookEntry {
    #[inline]
    fn key(&self) -> (u64, DateTime<Utc>, u64) {
        (self.rank, self.created_at, self.sequence)
    }
}

impl PartialEq for BookEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for BookEntry {}

impl PartialOrd for BookEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BookEntry {
    // BinaryHeap is a max-heap; the smallest key must compare greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// An order taken off the book that can be put back without losing its
/// place in the queue.
#[derive(Debug)]
pub struct RestingOrder {
    /// The order itself; the matcher decrements `qty` in place
    pub order: Order,
    sequence: u64,
}

/// One side of the book.
///
/// | Side | Best order | Matches incoming price `p` when |
/// |------|------------|---------------------------------|
/// | Buy  | highest price, then oldest | best price >= `p` |
/// | Sell | lowest price, then oldest  | best price <= `p` |
pub struct OrderBook {
    side: Side,
    heap: BinaryHeap<BookEntry>,
    /// Next insertion sequence number (tie-break for equal price and time)
    next_sequence: u64,
    /// Sum of resting quantity
    total_qty: u64,
}

impl OrderBook {
    /// Create an empty book for one side
    pub fn new(side: Side) -> Self {
        Self::with_capacity(side, 0)
    }

    /// Create an empty book with room for `orders` resting orders
    pub fn with_capacity(side: Side, orders: usize) -> Self {
        Self {
            side,
            heap: BinaryHeap::with_capacity(orders),
            next_sequence: 0,
            total_qty: 0,
        }
    }

    /// Which side this book holds
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    fn rank(&self, price: Price) -> u64 {
        match self.side {
            Side::Buy => !price.ticks(),
            Side::Sell => price.ticks(),
        }
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Add an order to the book.
    ///
    /// # Errors
    /// `InvalidQuantity` if the order has nothing left to rest,
    /// `SideMismatch` if it belongs to the other book.
    ///
    /// # Complexity
    /// O(log n)
    pub fn add(&mut self, order: Order) -> Result<(), OrderError> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.push(RestingOrder { order, sequence })
    }

    /// Put a previously popped order back with its original priority.
    ///
    /// # Complexity
    /// O(log n)
    pub fn restore(&mut self, resting: RestingOrder) -> Result<(), OrderError> {
        self.push(resting)
    }

    fn push(&mut self, resting: RestingOrder) -> Result<(), OrderError> {
        let RestingOrder { order, sequence } = resting;

        if order.qty == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        if order.side != self.side {
            return Err(OrderError::SideMismatch {
                expected: self.side,
                actual: order.side,
            });
        }

        trace!(side = %self.side, order_id = %order.order_id, price = %order.price, qty = order.qty, sequence, "book add");

        self.total_qty += u64::from(order.qty);
        self.heap.push(BookEntry {
            rank: self.rank(order.price),
            created_at: order.created_at,
            sequence,
            order,
        });
        Ok(())
    }

    /// Best-priority order without removing it.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn peek(&self) -> Option<&Order> {
        self.heap.peek().map(|entry| &entry.order)
    }

    /// Remove and return the best-priority order.
    ///
    /// # Complexity
    /// O(log n)
    pub fn pop(&mut self) -> Option<Order> {
        self.pop_resting().map(|resting| resting.order)
    }

    /// Remove the best-priority order, keeping what is needed to
    /// [`restore`](Self::restore) it at the same rank.
    pub fn pop_resting(&mut self) -> Option<RestingOrder> {
        let entry = self.heap.pop()?;
        self.total_qty -= u64::from(entry.order.qty);

        trace!(side = %self.side, order_id = %entry.order.order_id, "book pop");

        Some(RestingOrder {
            order: entry.order,
            sequence: entry.sequence,
        })
    }

    /// True if the best order here can trade against `counter_price`.
    #[inline]
    pub fn can_match(&self, counter_price: Price) -> bool {
        match (self.peek(), self.side) {
            (Some(best), Side::Buy) => best.price >= counter_price,
            (Some(best), Side::Sell) => best.price <= counter_price,
            (None, _) => false,
        }
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of resting orders
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Best resting price
    #[inline]
    pub fn best_price(&self) -> Option<Price> {
        self.peek().map(|order| order.price)
    }

    /// Total resting quantity
    #[inline]
    pub fn total_qty(&self) -> u64 {
        self.total_qty
    }

    /// Reserve room for `additional` more resting orders
    pub fn reserve(&mut self, additional: usize) {
        self.heap.reserve(additional);
    }

    /// All resting orders, best first.
    ///
    /// O(n log n); for inspection, not for the matching path.
    pub fn orders(&self) -> Vec<&Order> {
        let mut entries: Vec<&BookEntry> = self.heap.iter().collect();
        entries.sort_by_key(|entry| entry.key());
        entries.into_iter().map(|entry| &entry.order).collect()
    }

    /// Aggregated quantity per price level, best level first, at most
    /// `levels` entries.
    pub fn depth(&self, levels: usize) -> Vec<(Price, u64)> {
        let mut out: Vec<(Price, u64)> = Vec::new();
        for order in self.orders() {
            match out.last_mut() {
                Some((price, qty)) if *price == order.price => *qty += u64::from(order.qty),
                _ => {
                    if out.len() == levels {
                        break;
                    }
                    out.push((order.price, u64::from(order.qty)));
                }
            }
        }
        out
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("side", &self.side)
            .field("best_price", &self.best_price())
            .field("order_count", &self.heap.len())
            .field("total_qty", &self.total_qty)
            .finish()
    }
}
