//! # heap-lob
//!
//! A single-instrument limit order matching engine with strict
//! price-time priority.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: one caller owns the engine; `process_order` takes `&mut self`
//! - **Heap Books**: each side is a binary heap, O(1) peek and O(log n) insert/pop
//! - **Fixed-Point Prices**: integer ticks, so ordering and ties are exact
//! - **Maker Price**: every trade prints at the resting order's limit price
//!
//! ## Architecture
//!
//! ```text
//! [Caller] --> MatchingEngine::process_order --> [Vec<Execution>]
//!                   |                  |
//!              [Buy Book]         [Sell Book]
//! ```
//!
//! With the `runtime` feature, [`Engine::run`] drains an SPSC ring buffer
//! of orders on a dedicated thread and publishes [`OutputEvent`]s.

pub mod error;
pub mod price;
pub mod order;
pub mod order_book;
pub mod matching;
pub mod engine;
pub mod replay;

// Re-exports for convenience
pub use error::{OrderError, ReplayError};
pub use price::{Price, PRICE_SCALE};
pub use order::{Execution, Order, OrderId, OrderRejected, OrderRested, OutputEvent, Side};
pub use order_book::OrderBook;
pub use matching::MatchingEngine;
pub use engine::Engine;
