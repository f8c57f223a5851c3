//! CSV order files.
//!
//! Expected header: `order_id,side,price,quantity,timestamp`. The
//! timestamp column is optional (RFC 3339); a row without one is placed
//! one second after the row before it.

use std::io::Read;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ReplayError;
use crate::order::{Order, Side};
use crate::price::Price;

/// One raw row of an order file
#[derive(Debug, Deserialize)]
pub struct ReplayRow {
    pub order_id: String,
    pub side: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ReplayRow {
    /// Convert the raw row into an order.
    ///
    /// `row` is the 1-based data row, for error reporting. `fallback_time`
    /// is used when the row has no timestamp.
    pub fn to_order(&self, row: usize, fallback_time: DateTime<Utc>) -> Result<Order, ReplayError> {
        let side = parse_side(&self.side)?;
        let price = Price::from_decimal(self.price).map_err(|source| ReplayError::Order { row, source })?;

        Ok(Order::new(
            self.order_id.as_str(),
            side,
            price,
            self.quantity,
            self.timestamp.unwrap_or(fallback_time),
        ))
    }
}

/// Parse a side column. Accepts buy/bid/b and sell/ask/s, any case.
pub fn parse_side(raw: &str) -> Result<Side, ReplayError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "buy" | "bid" | "b" => Ok(Side::Buy),
        "sell" | "ask" | "s" => Ok(Side::Sell),
        _ => Err(ReplayError::InvalidSide(raw.to_owned())),
    }
}

/// Read every order from a CSV source.
///
/// A row without a timestamp is stamped one second after the previous
/// row (or after `base_time` for the first row), so files that mix
/// stamped and unstamped rows stay in time order.
/// Quantity is not validated here; the engine rejects zero quantities.
pub fn read_orders<R: Read>(reader: R, base_time: DateTime<Utc>) -> Result<Vec<Order>, ReplayError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut orders = Vec::new();
    let mut last = base_time;

    for (n, row) in csv.deserialize::<ReplayRow>().enumerate() {
        let row = row?;
        let order = row.to_order(n + 1, last + Duration::seconds(1))?;
        last = order.created_at;
        orders.push(order);
    }

    Ok(orders)
}
