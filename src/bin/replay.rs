use std::fs::File;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use clap::Parser;
use heap_lob::{replay, MatchingEngine, Side};
use tracing_subscriber::EnvFilter;

/// Feed a CSV order file through the matching engine.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Order file (order_id,side,price,quantity,timestamp)
    #[arg(short, long, default_value = "data/walkthrough.csv")]
    file: PathBuf,

    /// Price levels per side to print after each order
    #[arg(short, long, default_value_t = 1)]
    depth: usize,

    /// Only print the final book
    #[arg(short, long)]
    quiet: bool,
}

fn print_books(engine: &MatchingEngine, depth: usize) {
    for side in [Side::Buy, Side::Sell] {
        let levels = engine.book(side).depth(depth);
        if levels.is_empty() {
            println!("  Best {side:<4}: []");
            continue;
        }
        for (i, (price, qty)) in levels.iter().enumerate() {
            let label = if i == 0 { format!("Best {side:<4}") } else { " ".repeat(9) };
            println!("  {label}: {qty} @ {price:.2}");
        }
    }
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let base_time = Utc
        .with_ymd_and_hms(2025, 1, 1, 12, 0, 0)
        .single()
        .ok_or("invalid base time")?;
    let orders = replay::read_orders(File::open(&args.file)?, base_time)?;
    tracing::info!(file = %args.file.display(), orders = orders.len(), "loaded order file");

    let mut engine = MatchingEngine::with_capacity(orders.len());
    let mut total_executions = 0usize;

    for order in orders {
        if !args.quiet {
            println!(
                "--- Processing {} {} (Price: {:.2}, Qty: {}) ---",
                order.side, order.order_id, order.price, order.qty
            );
        }

        let executions = match engine.process_order(order) {
            Ok(executions) => executions,
            Err(e) => {
                println!("  Rejected: {e}");
                continue;
            }
        };
        total_executions += executions.len();

        if !args.quiet {
            if executions.is_empty() {
                println!("  No Executions");
            } else {
                println!("  Executions:");
                for exec in &executions {
                    println!(
                        "  - ExecID: {}, Price: {:.2}, Qty: {}",
                        exec.execution_id, exec.price, exec.qty
                    );
                    println!("    (Buy: {}, Sell: {})", exec.buy_order_id, exec.sell_order_id);
                }
            }
            print_books(&engine, args.depth);
        }
    }

    println!("=== Final book ({total_executions} executions) ===");
    for side in [Side::Buy, Side::Sell] {
        println!("  {side}:");
        for order in engine.book(side).orders() {
            println!("    {} ({}) @ {:.2}", order.order_id, order.qty, order.price);
        }
    }

    Ok(())
}
