//! Benchmark harness using Criterion for latency measurement.
//!
//! Measures:
//! - Place order (no match)
//! - Place order (full match)
//! - Sweep through a queue at one price
//! - Mixed workload

use chrono::{DateTime, Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use heap_lob::{Engine, Order, Price, Side};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Monotonic order stream: unique IDs and non-decreasing creation times
struct OrderFlow {
    start: DateTime<Utc>,
    next: u64,
}

impl OrderFlow {
    fn new() -> Self {
        Self { start: Utc::now(), next: 0 }
    }

    fn order(&mut self, side: Side, price: Price, qty: u32) -> Order {
        self.next += 1;
        Order::new(
            format!("O{}", self.next),
            side,
            price,
            qty,
            self.start + Duration::nanoseconds(self.next as i64),
        )
    }

    /// Random order between 99.00 and 101.00
    fn random(&mut self, rng: &mut ChaCha8Rng) -> Order {
        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let price = Price::from_ticks(rng.gen_range(9_900..10_100) * 100);
        self.order(side, price, rng.gen_range(1..1000))
    }
}

/// Benchmark: Place order that rests (no matching)
fn bench_place_no_match(c: &mut Criterion) {
    let mut engine = Engine::new(100_000);
    engine.warm_up();

    let mut flow = OrderFlow::new();

    c.bench_function("place_no_match", |b| {
        b.iter(|| {
            // Below any asks
            let order = flow.order(Side::Buy, Price::units(90), 100);
            black_box(engine.process(order))
        })
    });
}

/// Benchmark: Place order that fully matches
fn bench_place_full_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_full_match");

    for depth in [1, 10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let mut engine = Engine::new(100_000);
            engine.warm_up();
            let mut flow = OrderFlow::new();

            // Pre-populate with resting orders
            for _ in 0..depth {
                engine.process(flow.order(Side::Sell, Price::units(100), 100));
            }

            b.iter(|| {
                let result = engine.process(flow.order(Side::Buy, Price::units(100), 100));

                // Replenish the matched order
                engine.process(flow.order(Side::Sell, Price::units(100), 100));

                black_box(result)
            })
        });
    }

    group.finish();
}

/// Benchmark: One aggressive order walking a queue at a single price
fn bench_queue_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_sweep");

    for queue_len in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(queue_len), queue_len, |b, &queue_len| {
            b.iter_batched(
                || {
                    let mut engine = Engine::new(queue_len);
                    let mut flow = OrderFlow::new();
                    for _ in 0..queue_len {
                        engine.process(flow.order(Side::Buy, Price::units(100), 10));
                    }
                    let sweep = flow.order(Side::Sell, Price::units(100), queue_len as u32 * 10);
                    (engine, sweep)
                },
                |(mut engine, sweep)| black_box(engine.process(sweep)),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

/// Benchmark: Mixed workload around a two-dollar band
fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");

    group.bench_function("random_limit_flow", |b| {
        let mut engine = Engine::new(100_000);
        engine.warm_up();

        let mut rng = ChaCha8Rng::seed_from_u64(0xDEADBEEF);
        let mut flow = OrderFlow::new();

        // Pre-populate
        for _ in 0..1000 {
            engine.process(flow.random(&mut rng));
        }

        b.iter(|| black_box(engine.process(flow.random(&mut rng))))
    });

    group.finish();
}

/// Benchmark: Throughput (orders per second)
fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.throughput(criterion::Throughput::Elements(1000));

    group.bench_function("1000_orders", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(0xCAFEBABE);

        b.iter_batched(
            || {
                let mut flow = OrderFlow::new();
                let orders: Vec<_> = (0..1000).map(|_| flow.random(&mut rng)).collect();
                (Engine::new(1000), orders)
            },
            |(mut engine, orders)| {
                for order in orders {
                    black_box(engine.process(order));
                }
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_place_no_match,
    bench_place_full_match,
    bench_queue_sweep,
    bench_mixed_workload,
    bench_throughput,
);

criterion_main!(benches);
