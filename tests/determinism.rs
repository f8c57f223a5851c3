//! Determinism Test - Golden Master verification.
//!
//! Verifies that the engine produces identical results across runs
//! when given the same input sequence.

use chrono::{DateTime, Duration, TimeZone, Utc};
use heap_lob::{Engine, Order, OutputEvent, Price, Side};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

/// Generate a deterministic sequence of orders
fn generate_orders(seed: u64, count: usize) -> Vec<Order> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut orders = Vec::with_capacity(count);
    let mut clock = base_time();

    for n in 0..count {
        // Some orders share a timestamp so the sequence tie-break is exercised
        if rng.gen_bool(0.7) {
            clock += Duration::milliseconds(rng.gen_range(1..50));
        }

        orders.push(Order::new(
            format!("O{n}"),
            if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
            Price::from_ticks(rng.gen_range(9_500..10_500) * 100), // 95.00 to 105.00
            rng.gen_range(1..500),
            clock,
        ));
    }

    orders
}

/// Compute a hash of all output events
fn hash_events(events: &[OutputEvent]) -> u64 {
    let mut hasher = DefaultHasher::new();

    for event in events {
        match event {
            OutputEvent::Trade(t) => {
                "Trade".hash(&mut hasher);
                t.execution_id.hash(&mut hasher);
                t.price.hash(&mut hasher);
                t.qty.hash(&mut hasher);
                t.buy_order_id.hash(&mut hasher);
                t.sell_order_id.hash(&mut hasher);
            }
            OutputEvent::Rested(r) => {
                "Rested".hash(&mut hasher);
                r.order_id.hash(&mut hasher);
                r.side.hash(&mut hasher);
                r.price.hash(&mut hasher);
                r.qty.hash(&mut hasher);
            }
            OutputEvent::Rejected(r) => {
                "Rejected".hash(&mut hasher);
                r.order_id.hash(&mut hasher);
            }
        }
    }

    hasher.finish()
}

/// Run the engine over a sequence and return (events hash, state hash)
fn run_engine(orders: &[Order]) -> (u64, u64) {
    let mut engine = Engine::new(orders.len());
    let mut all_events = Vec::new();

    for order in orders {
        all_events.extend(engine.process(order.clone()));
    }

    (hash_events(&all_events), engine.state_hash())
}

#[test]
fn test_determinism_same_seed() {
    let orders = generate_orders(42, 10_000);

    let (events_1, state_1) = run_engine(&orders);
    let (events_2, state_2) = run_engine(&orders);

    assert_eq!(events_1, events_2, "Event hashes differ!");
    assert_eq!(state_1, state_2, "State hashes differ!");
}

#[test]
fn test_determinism_multiple_runs() {
    let orders = generate_orders(12345, 5_000);
    let (expected_events, expected_state) = run_engine(&orders);

    for run in 0..10 {
        let (events, state) = run_engine(&orders);
        assert_eq!(events, expected_events, "Run {run} event hash mismatch");
        assert_eq!(state, expected_state, "Run {run} state hash mismatch");
    }
}

#[test]
fn test_different_seeds_different_results() {
    let (events_1, _) = run_engine(&generate_orders(1, 1_000));
    let (events_2, _) = run_engine(&generate_orders(2, 1_000));

    assert_ne!(events_1, events_2, "Different seeds should produce different results");
}

#[test]
fn test_no_rejections_for_well_formed_flow() {
    let orders = generate_orders(7, 5_000);
    let mut engine = Engine::new(orders.len());

    for order in orders {
        let events = engine.process(order);
        assert!(
            !events.iter().any(|e| matches!(e, OutputEvent::Rejected(_))),
            "unexpected rejection: {events:?}"
        );
    }
}

#[test]
fn test_execution_ids_gap_free() {
    let orders = generate_orders(99, 5_000);
    let mut engine = Engine::new(orders.len());
    let mut expected_id = 1u64;

    for order in orders {
        for event in engine.process(order) {
            if let OutputEvent::Trade(t) = event {
                assert_eq!(t.execution_id, expected_id);
                expected_id += 1;
            }
        }
    }

    assert_eq!(engine.matcher.execution_count(), expected_id - 1);
}
