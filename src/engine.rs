//! Engine - Driver around the matching engine.
//!
//! Turns `process_order` results into output events and, with the
//! `runtime` feature, runs the engine on its own thread fed by an
//! rtrb ring buffer so that every order is processed strictly in
//! submission order by a single owner.

use tracing::warn;

use crate::matching::MatchingEngine;
use crate::order::{Order, OrderRejected, OrderRested, OutputEvent};
use crate::price::Price;

/// The main engine that processes orders and emits events.
pub struct Engine {
    /// The underlying matching engine
    pub matcher: MatchingEngine,
    /// Resting orders per side to reserve on warm-up
    capacity: usize,
}

impl Engine {
    /// Create a new engine sized for `capacity` resting orders per side.
    pub fn new(capacity: usize) -> Self {
        Self {
            matcher: MatchingEngine::with_capacity(capacity),
            capacity,
        }
    }

    /// Run the engine event loop.
    ///
    /// # Arguments
    /// * `input` - Consumer end of the order ring buffer
    /// * `output` - Producer end of the output event ring buffer
    /// * `pin_to_core` - Whether to pin to the last available CPU core
    ///
    /// # Note
    /// This function runs forever (until the program terminates).
    #[cfg(feature = "runtime")]
    pub fn run(
        &mut self,
        input: &mut rtrb::Consumer<Order>,
        output: &mut rtrb::Producer<OutputEvent>,
        pin_to_core: bool,
    ) {
        if pin_to_core {
            self.pin_to_core();
        }

        self.warm_up();
        tracing::info!(capacity = self.capacity, "engine loop started");

        loop {
            while let Ok(order) = input.pop() {
                for event in self.process(order) {
                    publish(output, event);
                }
            }
            std::hint::spin_loop();
        }
    }

    /// Process a single order and return output events.
    ///
    /// Trades come first, in fill order, followed by `Rested` if a
    /// remainder was left in the book. A rejected order yields a single
    /// `Rejected` event.
    pub fn process(&mut self, order: Order) -> Vec<OutputEvent> {
        let order_id = order.order_id.clone();
        let side = order.side;
        let price = order.price;
        let qty = order.qty;

        match self.matcher.process_order(order) {
            Ok(executions) => {
                let filled: u32 = executions.iter().map(|e| e.qty).sum();
                let mut events: Vec<OutputEvent> =
                    executions.into_iter().map(OutputEvent::Trade).collect();

                if filled < qty {
                    events.push(OutputEvent::Rested(OrderRested {
                        order_id,
                        side,
                        price,
                        qty: qty - filled,
                    }));
                }
                events
            }
            Err(reason) => {
                warn!(%order_id, %reason, "order rejected");
                vec![OutputEvent::Rejected(OrderRejected { order_id, reason })]
            }
        }
    }

    /// Pin the current thread to the last available CPU core.
    ///
    /// The last core is typically isolated from OS interrupts.
    pub fn pin_to_core(&self) {
        if let Some(core_ids) = core_affinity::get_core_ids() {
            if let Some(last_core) = core_ids.last() {
                if !core_affinity::set_for_current(*last_core) {
                    warn!(core = last_core.id, "failed to pin engine thread");
                }
            }
        }
    }

    /// Reserve book capacity up front so the first orders do not reallocate.
    pub fn warm_up(&mut self) {
        let spare = self.capacity.saturating_sub(self.matcher.order_count());
        self.matcher.reserve(spare);
    }

    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.matcher.best_bid()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.matcher.best_ask()
    }

    #[inline]
    pub fn spread(&self) -> Option<u64> {
        self.matcher.spread()
    }

    /// Total resting orders.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.matcher.order_count()
    }

    /// Compute state hash for determinism testing.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.matcher.state_hash()
    }
}

/// Push an event, spinning until the consumer frees a slot. Events are
/// never dropped.
#[cfg(feature = "runtime")]
fn publish(output: &mut rtrb::Producer<OutputEvent>, event: OutputEvent) {
    let mut pending = event;
    let mut stalled = false;
    loop {
        match output.push(pending) {
            Ok(()) => return,
            Err(rtrb::PushError::Full(event)) => {
                if !stalled {
                    tracing::debug!("output ring full, waiting for consumer");
                    stalled = true;
                }
                pending = event;
                std::hint::spin_loop();
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(100_000)
    }
}
