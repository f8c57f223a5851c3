//! Fixed-point prices.
//!
//! Prices are stored as integer ticks so that comparisons and tie-breaks
//! are exact. `rust_decimal` is only used at the edges, when a price is
//! parsed from user input or rendered for display.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Number of decimal places a price can carry.
pub const PRICE_DECIMALS: u32 = 4;

/// Ticks per whole currency unit (e.g. $10.01 -> 100_100).
pub const PRICE_SCALE: u64 = 10u64.pow(PRICE_DECIMALS);

/// A strictly positive limit price in ticks of `1 / PRICE_SCALE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Build a price directly from ticks.
    #[inline]
    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Raw tick value.
    #[inline]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Whole units, for tests and demos (`Price::units(100)` is 100.0).
    #[inline]
    pub const fn units(units: u64) -> Self {
        Self(units * PRICE_SCALE)
    }

    /// Convert a decimal price into ticks.
    ///
    /// Fails when the value is not positive, carries more than
    /// `PRICE_DECIMALS` fractional digits, or does not fit in a `u64`.
    pub fn from_decimal(value: Decimal) -> Result<Self, OrderError> {
        if value <= Decimal::ZERO {
            return Err(OrderError::InvalidPrice(format!("{value} is not positive")));
        }

        let scaled = value
            .checked_mul(Decimal::from(PRICE_SCALE))
            .ok_or_else(|| OrderError::InvalidPrice(format!("{value} is out of range")))?;

        if !scaled.fract().is_zero() {
            return Err(OrderError::InvalidPrice(format!(
                "{value} has more than {PRICE_DECIMALS} decimal places"
            )));
        }

        scaled
            .to_u64()
            .map(Self)
            .ok_or_else(|| OrderError::InvalidPrice(format!("{value} is out of range")))
    }

    /// The price as a decimal number of currency units.
    pub fn to_decimal(self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), PRICE_DECIMALS).normalize()
    }
}

impl FromStr for Price {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| OrderError::InvalidPrice(format!("{s:?}: {e}")))?;
        Self::from_decimal(value)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = OrderError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Decimal honours width and precision flags
        fmt::Display::fmt(&self.to_decimal(), f)
    }
}
