use chrono::{Duration, Utc};
use clap::Parser;
use hdrhistogram::Histogram;
use heap_lob::{Engine, Order, Price, Side};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Per-order latency report for the matching engine.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Orders to submit
    #[arg(short, long, default_value_t = 1_000_000)]
    iterations: u64,

    /// Resting orders to reserve per side
    #[arg(short, long, default_value_t = 100_000)]
    capacity: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    println!("Preparing Latency Benchmark...");

    // Setup
    let mut engine = Engine::new(args.capacity);
    engine.warm_up();

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000, 3)?;

    println!("Running {} iterations...", args.iterations);

    let start_time = Utc::now();
    let mut total_duration = std::time::Duration::new(0, 0);

    // Build orders outside the measured section
    for n in 1..=args.iterations {
        let order = Order::new(
            format!("O{n}"),
            if n % 2 == 0 { Side::Buy } else { Side::Sell },
            Price::from_ticks(1_000_000 + (n % 100) * 100),
            10,
            start_time + Duration::microseconds(n as i64),
        );

        // Critical measurement section
        let start = Instant::now();

        // Use black_box to prevent compiler optimization
        std::hint::black_box(engine.process(order));

        let elapsed = start.elapsed();

        // Outliers above the histogram bound are dropped
        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total_duration += elapsed;
    }

    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {}", args.iterations);
    println!("Throughput: {:.2} ops/sec", args.iterations as f64 / total_duration.as_secs_f64());
    println!("Resting:    {} orders", engine.order_count());
    println!("---------------------------");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:6} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:6} ns", histogram.max());
    println!("---------------------------");

    println!("\nDistribution:");
    for v in histogram.iter_log(100, 2.0) {
        let count = v.count_since_last_iteration();
        if count > 0 {
            println!("<= {:6} ns: {:10} count", v.value_iterated_to(), count);
        }
    }

    Ok(())
}
