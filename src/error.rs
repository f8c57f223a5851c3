//! Error types for order validation and replay input.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::order::{OrderId, Side};

/// Reasons an order is refused before it touches either book.
///
/// A rejected order leaves the engine exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("order quantity must be positive")]
    InvalidQuantity,

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("order {order_id} created at {created_at} precedes last accepted order at {last}")]
    NonMonotonicTime {
        order_id: OrderId,
        created_at: DateTime<Utc>,
        last: DateTime<Utc>,
    },

    #[error("order {0} is already resting in the book")]
    DuplicateOrderId(OrderId),

    #[error("{actual:?} order cannot rest in the {expected:?} book")]
    SideMismatch { expected: Side, actual: Side },
}

/// Errors raised while loading an order file.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid side {0:?} (expected buy/sell)")]
    InvalidSide(String),

    #[error("row {row}: {source}")]
    Order {
        row: usize,
        #[source]
        source: OrderError,
    },
}
