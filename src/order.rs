//! Order and Execution types for the matching engine.
//!
//! Orders are inputs from the caller.
//! Executions and output events are what the engine hands back.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::price::Price;

/// Order side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.pad("Buy"),
            Side::Sell => f.pad("Sell"),
        }
    }
}

/// Caller-assigned order identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

// ============================================================================
// Input
// ============================================================================

/// A limit order.
///
/// `qty` is the remaining quantity: the engine decrements it in place as
/// the order fills. An order with `qty == 0` never sits in a book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Caller-assigned order ID
    pub order_id: OrderId,
    /// Order side (buy/sell)
    pub side: Side,
    /// Limit price
    pub price: Price,
    /// Remaining quantity
    pub qty: u32,
    /// Creation time, only used for time priority
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        order_id: impl Into<OrderId>,
        side: Side,
        price: Price,
        qty: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            side,
            price,
            qty,
            created_at,
        }
    }

    /// Shorthand for a buy order.
    pub fn buy(order_id: impl Into<OrderId>, price: Price, qty: u32, created_at: DateTime<Utc>) -> Self {
        Self::new(order_id, Side::Buy, price, qty, created_at)
    }

    /// Shorthand for a sell order.
    pub fn sell(order_id: impl Into<OrderId>, price: Price, qty: u32, created_at: DateTime<Utc>) -> Self {
        Self::new(order_id, Side::Sell, price, qty, created_at)
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.qty == 0
    }
}

// ============================================================================
// Output
// ============================================================================

/// A trade between one buy order and one sell order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// Engine-assigned ID, strictly increasing from 1
    pub execution_id: u64,
    /// Execution price (always the resting order's limit price)
    pub price: Price,
    /// Executed quantity
    pub qty: u32,
    /// Buy-side order ID
    pub buy_order_id: OrderId,
    /// Sell-side order ID
    pub sell_order_id: OrderId,
}

/// The unfilled remainder of an order was placed in its book
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRested {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    /// Quantity left resting
    pub qty: u32,
}

/// Order was rejected
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRejected {
    pub order_id: OrderId,
    pub reason: OrderError,
}

/// Output events from the engine driver
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    /// Trade executed
    Trade(Execution),
    /// Remainder resting in the book
    Rested(OrderRested),
    /// Order rejected
    Rejected(OrderRejected),
}
